//! Axum response adapters for the core envelope and error types.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use formgate_core::{Envelope, GatewayError};

/// An [`Envelope`] rendered as a JSON response.
#[derive(Debug)]
pub struct JsonEnvelope(pub Envelope);

impl IntoResponse for JsonEnvelope {
    fn into_response(self) -> Response {
        let Envelope { status, body } = self.0;
        (status, Json(serde_json::Value::Object(body))).into_response()
    }
}

/// A [`GatewayError`] rendered as an `{ok: false, error}` response.
///
/// Only the client-safe message is serialized.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        JsonEnvelope(self.0.into_envelope()).into_response()
    }
}
