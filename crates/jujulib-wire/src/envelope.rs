//! JSON frames exchanged with the controller.
//!
//! ```text
//! Request:  {"type": <facade>, "request": <method>, "version": <int>,
//!            "params": {...}, "request-id": <int>}
//! Response: {"request-id": <int>, "response": {...}}
//!         | {"request-id": <int>, "error": <string | {"message": ...}>}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An outgoing RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub facade: String,

    pub request: String,

    pub version: u32,

    pub params: Value,

    #[serde(rename = "request-id")]
    pub request_id: u64,
}

impl Request {
    /// Build a request envelope. A `null` params value becomes `{}`, since the
    /// controller rejects requests without a params object.
    pub fn new(
        facade: impl Into<String>,
        request: impl Into<String>,
        version: u32,
        params: Value,
        request_id: u64,
    ) -> Self {
        let params = if params.is_null() {
            Value::Object(Default::default())
        } else {
            params
        };

        Self {
            facade: facade.into(),
            request: request.into(),
            version,
            params,
            request_id,
        }
    }
}

/// An error reported by the controller, either for a whole request or for one
/// entity of a batch request.
///
/// Decoding never fails: a bare string is the message, an object contributes
/// its `message` and `code`, and any other shape keeps its JSON text as the
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RemoteError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RemoteError {}

impl From<Value> for RemoteError {
    fn from(value: Value) -> Self {
        let code = value
            .get("code")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let message = match &value {
            Value::String(message) => message.clone(),
            Value::Object(fields) => match fields.get("message").and_then(Value::as_str) {
                Some(message) => message.to_string(),
                None => value.to_string(),
            },
            _ => value.to_string(),
        };

        RemoteError { message, code }
    }
}

/// An incoming frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    #[serde(rename = "request-id", default)]
    pub request_id: Option<u64>,

    #[serde(default)]
    pub response: Option<Value>,

    #[serde(default)]
    pub error: Option<RemoteError>,

    #[serde(rename = "error-code", default, deserialize_with = "lenient_code")]
    pub error_code: Option<String>,
}

fn lenient_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(code)) => Some(code),
        _ => None,
    })
}

impl Response {
    /// Split the frame into its payload or its error. A frame carrying neither
    /// yields an empty object.
    pub fn into_result(self) -> Result<Value, RemoteError> {
        match self.error {
            Some(mut error) => {
                if error.code.is_none() {
                    error.code = self.error_code;
                }
                Err(error)
            }
            None => Ok(self
                .response
                .unwrap_or_else(|| Value::Object(Default::default()))),
        }
    }
}
