// Agent credentials for the HTTP transport
use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::info;

#[derive(Clone)]
struct Credential {
    token: String,
    issued_at: DateTime<Utc>,
}

/// Holds the bearer token for the current login. Created at login, replaced
/// on refresh and discarded at end; the transport reads it per request.
#[derive(Default)]
pub struct Session {
    credential: RwLock<Option<Credential>>,
}

impl Session {
    pub fn login(token: impl Into<String>) -> Self {
        let session = Self::default();
        session.refresh(token);
        session
    }

    /// Swaps in a new token; in-flight requests keep the one they read.
    pub fn refresh(&self, token: impl Into<String>) {
        let credential = Credential {
            token: token.into(),
            issued_at: Utc::now(),
        };
        *self.credential.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
        info!("🔑 session credentials updated");
    }

    pub fn end(&self) {
        self.credential
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        info!("🔒 session ended");
    }

    pub fn is_active(&self) -> bool {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// `Authorization` header value, if logged in.
    pub fn bearer(&self) -> Option<String> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| format!("Bearer {}", c.token))
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.issued_at)
    }
}

// Never print the token itself
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("active", &self.is_active())
            .field("issued_at", &self.issued_at())
            .finish()
    }
}
