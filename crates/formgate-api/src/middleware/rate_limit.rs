//! Rate-limit token guard.
//!
//! An edge rate limiter in front of the gateway tags requests with a shared
//! token. A request that presents a different token is rejected before its
//! body is read. Requests without the header pass through.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use formgate_core::GatewayError;
use tracing::warn;

use crate::{response::ApiError, AppState};

/// Header carrying the rate-limit token.
pub const RATE_LIMIT_HEADER: &str = "x-rate-limit-token";

/// Extracts the presented token. Empty values count as absent.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(RATE_LIMIT_HEADER).and_then(|v| v.to_str().ok()).filter(|s| !s.is_empty())
}

/// Decides whether a presented token is acceptable.
fn token_accepted(expected: Option<&str>, presented: Option<&str>) -> bool {
    match (expected, presented) {
        (Some(expected), Some(presented)) => expected == presented,
        _ => true,
    }
}

/// Axum middleware enforcing the rate-limit token.
pub async fn rate_limit_guard(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if !token_accepted(state.config.rate_limit_token(), extract_token(req.headers())) {
        warn!(path = %req.uri().path(), "Rejected request with mismatched rate-limit token");
        return Err(GatewayError::Unauthorized.into());
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn extract_token_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(RATE_LIMIT_HEADER, HeaderValue::from_static("edge-token"));

        assert_eq!(extract_token(&headers), Some("edge-token"));
    }

    #[test]
    fn extract_token_ignores_empty_header() {
        let mut headers = HeaderMap::new();
        headers.insert(RATE_LIMIT_HEADER, HeaderValue::from_static(""));

        assert_eq!(extract_token(&headers), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn only_mismatch_is_rejected() {
        assert!(token_accepted(None, None));
        assert!(token_accepted(None, Some("anything")));
        assert!(token_accepted(Some("t"), None));
        assert!(token_accepted(Some("t"), Some("t")));
        assert!(!token_accepted(Some("t"), Some("u")));
    }
}
