//! Error types for outbound calls.
//!
//! Every variant is a transport-level failure from the caller's point of
//! view. Upstream HTTP error statuses are not errors here: they come back as
//! a normal [`UpstreamResponse`](crate::client::UpstreamResponse).

use formgate_core::GatewayError;
use thiserror::Error;

/// Result type alias for upstream operations.
pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Failures talking to the upstream API or a side-channel service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure, reset, TLS failure.
    #[error("network connection failed: {message}")]
    Network {
        /// Error message describing the network failure
        message: String,
    },

    /// Latency budget exceeded; the call was cancelled.
    #[error("request timeout after {timeout_ms}ms")]
    Timeout {
        /// Budget that was exceeded, in milliseconds
        timeout_ms: u64,
    },

    /// Success status with a body that is not JSON.
    #[error("invalid response body: {message}")]
    InvalidBody {
        /// Parser error
        message: String,
    },

    /// HTTP client could not be built or the target URL is unusable.
    #[error("invalid client configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl UpstreamError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Creates an invalid-body error.
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::InvalidBody { message: message.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Categorizes a reqwest failure.
    pub(crate) fn from_reqwest(error: &reqwest::Error, timeout_ms: u64) -> Self {
        if error.is_timeout() {
            Self::timeout(timeout_ms)
        } else if error.is_connect() {
            Self::network(format!("connection failed: {error}"))
        } else if error.is_decode() {
            Self::invalid_body(error.to_string())
        } else {
            Self::network(error.to_string())
        }
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(error: UpstreamError) -> Self {
        GatewayError::transport(error.to_string())
    }
}
