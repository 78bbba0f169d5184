//! On-demand page revalidation.

use std::collections::HashMap;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use formgate_core::inbound;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::AppState;

/// Invalidates cached pages after content changes.
pub trait PageRevalidator: Send + Sync {
    /// Marks `path` as stale.
    fn revalidate(&self, path: &str);
}

/// Revalidator that only records the request in the log. Default when no
/// page cache is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRevalidator;

impl PageRevalidator for LoggingRevalidator {
    fn revalidate(&self, path: &str) {
        info!(path, "Page revalidation requested");
    }
}

/// `POST /api/revalidate?secret=...`
#[instrument(name = "revalidate", skip_all)]
pub async fn revalidate(
    State(state): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Bytes,
) -> Response {
    let presented = query.ok().and_then(|Query(mut params)| params.remove("secret"));

    let authorized = match (state.config.revalidation_secret(), presented.as_deref()) {
        (Some(expected), Some(presented)) => expected == presented,
        _ => false,
    };
    if !authorized {
        warn!("Revalidation rejected: invalid secret");
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid secret" })))
            .into_response();
    }

    let path = inbound::parse_body(&body)
        .and_then(|body| match body.get("path") {
            Some(Value::String(path)) => Some(path.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "/".to_string());

    state.revalidator.revalidate(&path);

    (StatusCode::OK, Json(json!({ "revalidated": true, "path": path }))).into_response()
}
