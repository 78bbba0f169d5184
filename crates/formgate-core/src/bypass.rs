//! Bypass policy for trusted automated callers.
//!
//! End-to-end test suites cannot solve a bot challenge, so they present a
//! shared secret instead. The secret may arrive in a header, a cookie, or in
//! place of the challenge token in the body.

use std::fmt;

use http::{header::COOKIE, HeaderMap};

/// Header carrying the internal shared secret.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// Cookie carrying the internal shared secret.
pub const INTERNAL_TOKEN_COOKIE: &str = "cg_internal";

/// Body field carrying the bot challenge token.
pub const BOT_TOKEN_FIELD: &str = "turnstileToken";

/// Credentials a request presents for bypassing bot verification.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BypassCredentials {
    /// Value of the `x-internal-token` header.
    pub header: Option<String>,
    /// Value of the `cg_internal` cookie.
    pub cookie: Option<String>,
    /// Challenge token from the request body.
    pub body_token: Option<String>,
}

impl BypassCredentials {
    /// Collects credentials from request headers and the body token.
    pub fn from_request(headers: &HeaderMap, body_token: Option<&str>) -> Self {
        let header = headers
            .get(INTERNAL_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let cookie = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| cookie_value(raw, INTERNAL_TOKEN_COOKIE))
            .map(String::from);

        Self { header, cookie, body_token: body_token.map(String::from) }
    }

    fn candidates(&self) -> impl Iterator<Item = &str> {
        [&self.header, &self.cookie, &self.body_token].into_iter().filter_map(|v| v.as_deref())
    }
}

impl fmt::Debug for BypassCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("BypassCredentials")
            .field("header", &mask(&self.header))
            .field("cookie", &mask(&self.cookie))
            .field("body_token", &mask(&self.body_token))
            .finish()
    }
}

/// Extracts a cookie by name from a `Cookie` header value.
pub fn cookie_value<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Returns `true` when bot verification may be skipped.
///
/// Requires a non-empty configured secret that equals one of the presented
/// credentials.
pub fn should_bypass(secret: Option<&str>, credentials: &BypassCredentials) -> bool {
    match secret {
        Some(secret) if !secret.is_empty() => credentials.candidates().any(|c| c == secret),
        _ => false,
    }
}
