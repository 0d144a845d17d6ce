use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        };
        f.write_str(name)
    }
}

/// One authenticated round-trip to the game service.
///
/// `path` is relative to the API root (for example `my/ships/S1/orbit`).
/// On success the full JSON body is returned, with the result nested under
/// `data`; an empty body comes back as `Value::Null`. Failures carry the
/// service's error payload verbatim.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, path: &str, method: Method, body: Option<Value>) -> Result<Value, ApiError>;
}
