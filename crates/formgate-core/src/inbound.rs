//! Inbound request parsing.
//!
//! Parsing never fails loudly: anything that is not a JSON object is treated
//! as an absent body, and validation then rejects it.

use std::collections::HashMap;

use serde_json::Value;

use crate::{bypass::BOT_TOKEN_FIELD, JsonMap};

/// Parses a request body into a JSON object.
pub fn parse_body(bytes: &[u8]) -> Option<JsonMap> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Converts query parameters into a JSON object of strings.
pub fn from_query(params: HashMap<String, String>) -> JsonMap {
    params.into_iter().map(|(key, value)| (key, Value::String(value))).collect()
}

/// Challenge token supplied in the body, if any.
pub fn bot_token(body: Option<&JsonMap>) -> Option<&str> {
    body?.get(BOT_TOKEN_FIELD)?.as_str().filter(|s| !s.is_empty())
}
