//! Readiness questionnaire listing.
//!
//! Non-critical content: any failure degrades to an empty list with 200 so
//! the page still renders.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use formgate_core::{EndpointSpec, JsonMap};
use formgate_upstream::{endpoint_url, UpstreamCall};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::AppState;

/// Serves the question list for `spec`.
#[instrument(name = "readiness_questions", skip_all, fields(endpoint = spec.name))]
pub async fn handle(state: AppState, spec: &'static EndpointSpec) -> Response {
    let Some(url) =
        state.base_urls.first().and_then(|base| endpoint_url(base, &spec.upstream, &JsonMap::new()))
    else {
        warn!("No usable upstream URL for readiness questions");
        return empty_listing();
    };

    match state.upstream.forward(UpstreamCall::get(url).with_timeout(spec.timeout)).await {
        Ok(response) if response.is_success() && has_questions(&response.body) => {
            debug!("Serving upstream readiness questions");
            (StatusCode::OK, Json(response.body)).into_response()
        },
        Ok(response) => {
            warn!(status = response.status.as_u16(), "Upstream returned no readiness questions");
            empty_listing()
        },
        Err(e) => {
            warn!("Readiness questions unavailable: {}", e);
            empty_listing()
        },
    }
}

fn has_questions(body: &Value) -> bool {
    body.get("questions").and_then(Value::as_array).is_some_and(|items| !items.is_empty())
}

fn empty_listing() -> Response {
    (StatusCode::OK, Json(json!({ "questions": [] }))).into_response()
}
