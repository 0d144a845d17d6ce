// reqwest-backed transport to the SpaceTraders REST API
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

use crate::client::{Method, Session, Transport};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// HTTP transport with request pacing. It never retries: a 429 or a network
/// failure is returned to the caller like any other error.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpTransport {
    pub fn new(
        base_url: &str,
        session: Arc<Session>,
        timeout: Duration,
        min_interval: Duration,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            min_interval,
            last_request: Mutex::new(None),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // Keeps at least `min_interval` between request starts across all callers.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, path: &str, method: Method, body: Option<Value>) -> Result<Value, ApiError> {
        self.pace().await;

        let url = self.url(path);
        debug!(%method, path, "🌐 API request");

        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
        };
        if let Some(bearer) = self.session.bearer() {
            request = request.header(AUTHORIZATION, bearer);
        }
        // POST endpoints expect a JSON body even when they take no fields
        match body {
            Some(body) => request = request.json(&body),
            None if method != Method::Get => request = request.json(&serde_json::json!({})),
            None => {}
        }

        let response = request.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "HTTP request failed");
            ApiError::network(format!("HTTP request failed: {}", e))
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("failed to read response body: {}", e)))?;
        trace!(%method, path, status = status.as_u16(), body = %text, "API response");

        decode_response(status, &text)
    }
}

/// Maps a status and raw body to the transport result.
pub fn decode_response(status: StatusCode, text: &str) -> Result<Value, ApiError> {
    if status.is_success() {
        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(text).map_err(|e| {
            ApiError::new(
                i64::from(status.as_u16()),
                format!("response body is not JSON: {}", e),
            )
        });
    }

    let error = match serde_json::from_str::<ErrorEnvelope>(text) {
        Ok(envelope) => envelope.error,
        Err(_) => ApiError::new(
            i64::from(status.as_u16()),
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        ),
    };
    warn!(status = status.as_u16(), code = error.code, message = %error.message, "API error");
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_body_is_passed_through() {
        let value = decode_response(StatusCode::OK, r#"{"data":{"symbol":"S1"}}"#).unwrap();
        assert_eq!(value["data"]["symbol"], "S1");
    }

    #[test]
    fn no_content_is_null() {
        assert_eq!(decode_response(StatusCode::NO_CONTENT, "").unwrap(), Value::Null);
    }

    #[test]
    fn error_envelope_is_decoded_verbatim() {
        let body = json!({
            "error": {
                "code": 4000,
                "message": "Ship action is still on cooldown",
                "data": {"cooldown": {"remainingSeconds": 12}}
            }
        });
        let err = decode_response(StatusCode::CONFLICT, &body.to_string()).unwrap_err();

        assert_eq!(err.code, 4000);
        assert_eq!(err.message, "Ship action is still on cooldown");
        assert_eq!(err.cooldown_hint(), Some(Duration::from_secs(12)));
    }

    #[test]
    fn unstructured_error_falls_back_to_status() {
        let err = decode_response(StatusCode::BAD_GATEWAY, "<html>oops</html>").unwrap_err();
        assert_eq!(err.code, 502);
    }

    #[test]
    fn url_joins_without_double_slash() {
        let transport = HttpTransport::new(
            "https://api.spacetraders.io/v2/",
            Arc::new(Session::login("t")),
            Duration::from_secs(5),
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(
            transport.url("/my/agent"),
            "https://api.spacetraders.io/v2/my/agent"
        );
    }
}
