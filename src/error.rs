// Error taxonomy for the sync engine
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::operations::ActionKind;
use crate::storage::EntityKind;

/// Error payload reported by the remote service (or synthesized by the
/// transport for network failures, with code 0).
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("API error {code}: {message}")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Coarse grouping of [`ApiError`] codes so callers can tell throttling and
/// outages apart from game-rule refusals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    Network,
    RateLimited,
    Maintenance,
    Unauthorized,
    Game,
    Other,
}

pub const NETWORK_ERROR_CODE: i64 = 0;

impl ApiError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(NETWORK_ERROR_CODE, message)
    }

    pub fn category(&self) -> ApiErrorCategory {
        match self.code {
            NETWORK_ERROR_CODE => ApiErrorCategory::Network,
            429 => ApiErrorCategory::RateLimited,
            401 | 403 => ApiErrorCategory::Unauthorized,
            500..=599 => ApiErrorCategory::Maintenance,
            3000..=4999 => ApiErrorCategory::Game,
            _ => ApiErrorCategory::Other,
        }
    }

    /// Whether a caller-side retry could reasonably succeed. The engine itself
    /// never retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::Network | ApiErrorCategory::RateLimited | ApiErrorCategory::Maintenance
        )
    }

    /// Remaining cooldown carried in `data.cooldown.remainingSeconds`, as sent
    /// with cooldown-conflict refusals.
    pub fn cooldown_hint(&self) -> Option<Duration> {
        self.data
            .as_ref()?
            .get("cooldown")?
            .get("remainingSeconds")?
            .as_u64()
            .map(Duration::from_secs)
    }

    /// Seconds until the rate limiter resets, when reported.
    pub fn retry_after(&self) -> Option<Duration> {
        self.data
            .as_ref()?
            .get("retryAfter")?
            .as_f64()
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: String },
    #[error("rejected cargo for {ship}: {reason}")]
    InvalidCargo { ship: String, reason: String },
}

/// Tagged failure returned by every action dispatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("invalid {kind} action: {reason}")]
    InvalidAction { kind: ActionKind, reason: String },

    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: String },

    #[error("ship {ship} is on cooldown for another {}s", .remaining.as_secs())]
    CooldownActive { ship: String, remaining: Duration },

    #[error("transport error {}: {}", .0.code, .0.message)]
    Transport(#[from] ApiError),

    #[error("malformed {kind} response: {reason}")]
    MalformedResponse { kind: ActionKind, reason: String },

    #[error("cancelled while waiting for {ship} to leave cooldown")]
    Cancelled { ship: String },
}

impl ActionError {
    pub fn invalid(kind: ActionKind, reason: impl Into<String>) -> Self {
        ActionError::InvalidAction {
            kind,
            reason: reason.into(),
        }
    }

    /// Raised before any network call was made.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            ActionError::Transport(_) | ActionError::MalformedResponse { .. }
        )
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ActionError::Transport(err) => Some(err),
            _ => None,
        }
    }

    /// Store failures during apply mean the response could not be written
    /// consistently; a missing key stays a `NotFound`.
    pub fn from_store(kind: ActionKind, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind: entity, key } => ActionError::NotFound { kind: entity, key },
            StoreError::InvalidCargo { ship, reason } => ActionError::MalformedResponse {
                kind,
                reason: format!("{}: {}", ship, reason),
            },
        }
    }
}
