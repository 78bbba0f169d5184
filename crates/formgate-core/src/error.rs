//! Error taxonomy for gateway requests.
//!
//! Every failure a request can hit is one of four kinds: the client sent
//! something unusable, bot verification rejected it, the upstream API said
//! no, or the upstream API could not be reached. Each kind maps to exactly
//! one HTTP status and one client-safe message, so handlers never leak
//! internal error text.

use http::StatusCode;
use thiserror::Error;

use crate::envelope::{Envelope, BOT_VERIFICATION_FAILED, TRANSPORT_ERROR_MESSAGE};

/// Result type alias using `GatewayError`.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced by the gateway pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Required fields missing or malformed; never reaches upstream.
    #[error("validation failed: {message}")]
    Validation {
        /// Fixed, endpoint-specific message returned to the caller
        message: String,
    },

    /// Bot challenge rejected; never reaches upstream.
    #[error("bot verification failed")]
    BotVerification,

    /// Caller presented a credential that does not match configuration.
    #[error("unauthorized")]
    Unauthorized,

    /// Upstream answered with a non-success status.
    #[error("upstream error: HTTP {status}: {message}")]
    Upstream {
        /// Status returned to the caller (mirrored or normalized)
        status: StatusCode,
        /// Detail extracted from the upstream body or the endpoint default
        message: String,
    },

    /// Upstream could not be reached or returned an unreadable body.
    #[error("transport failure: {reason}")]
    Transport {
        /// Internal description, logged but never returned
        reason: String,
    },
}

impl GatewayError {
    /// Creates a validation error with the endpoint's message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Creates an upstream error.
    pub fn upstream(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Upstream { status, message: message.into() }
    }

    /// Creates a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport { reason: reason.into() }
    }

    /// Short machine-readable kind, used as a tracing field.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::BotVerification => "bot_verification",
            Self::Unauthorized => "unauthorized",
            Self::Upstream { .. } => "upstream",
            Self::Transport { .. } => "transport",
        }
    }

    /// HTTP status returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::BotVerification => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Upstream { status, .. } => *status,
            Self::Transport { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to show the caller.
    pub fn client_message(&self) -> &str {
        match self {
            Self::Validation { message } | Self::Upstream { message, .. } => message,
            Self::BotVerification => BOT_VERIFICATION_FAILED,
            Self::Unauthorized => "Unauthorized.",
            Self::Transport { .. } => TRANSPORT_ERROR_MESSAGE,
        }
    }

    /// Converts the error into its `{ok: false, error}` envelope.
    pub fn into_envelope(self) -> Envelope {
        Envelope::failure(self.status(), self.client_message())
    }
}
