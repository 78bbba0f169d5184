//! The uniform `{ok, ...}` response shape.

use http::StatusCode;
use serde_json::Value;

use crate::JsonMap;

/// Returned whenever the upstream API could not be reached.
pub const TRANSPORT_ERROR_MESSAGE: &str = "Failed to reach the API.";

/// Returned when bot verification rejects a request.
pub const BOT_VERIFICATION_FAILED: &str = "Bot verification failed.";

/// Response body plus status, ready to be serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Status sent to the caller.
    pub status: StatusCode,
    /// JSON object body; always carries `ok`.
    pub body: JsonMap,
}

impl Envelope {
    /// Wraps a successful upstream reply.
    ///
    /// Object bodies are merged after `ok`. Any other JSON value is nested
    /// under `data`. `204 No Content` becomes 200 since the envelope has a body.
    pub fn success(status: StatusCode, upstream: Value) -> Self {
        let mut body = JsonMap::new();
        body.insert("ok".into(), Value::Bool(true));

        match upstream {
            Value::Object(fields) => {
                for (key, value) in fields {
                    if key != "ok" {
                        body.insert(key, value);
                    }
                }
            },
            Value::Null => {},
            other => {
                body.insert("data".into(), other);
            },
        }

        let status = if status == StatusCode::NO_CONTENT { StatusCode::OK } else { status };
        Self { status, body }
    }

    /// Builds an error envelope.
    pub fn failure(status: StatusCode, message: &str) -> Self {
        let mut body = JsonMap::new();
        body.insert("ok".into(), Value::Bool(false));
        body.insert("error".into(), Value::String(message.to_string()));
        Self { status, body }
    }

    /// Adds a field to the body.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.body.insert(key.to_string(), value.into());
        self
    }

    /// Whether this is a success envelope.
    pub fn is_ok(&self) -> bool {
        self.body.get("ok").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Consumes the envelope, returning the body as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}

/// Picks the human-readable error text from an upstream failure body.
///
/// Looks at `detail` (string, or the first `msg` of a validation error list),
/// then `error`, then falls back to `default`.
pub fn upstream_error_message(body: &Value, default: &str) -> String {
    let detail = match body.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        Some(Value::Array(items)) => {
            items.iter().find_map(|item| item.get("msg").and_then(Value::as_str))
        },
        _ => None,
    };

    detail
        .or_else(|| body.get("error").and_then(Value::as_str).filter(|s| !s.is_empty()))
        .unwrap_or(default)
        .to_string()
}
