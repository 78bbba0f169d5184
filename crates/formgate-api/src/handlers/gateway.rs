//! Generic gateway handler driving every endpoint table row.
//!
//! Pipeline per request:
//! 1. Parse body (POST) or query (GET)
//! 2. Validate required fields
//! 3. Bot gate
//! 4. Translate field names
//! 5. Forward upstream, with failover across base URLs where enabled
//! 6. Fire the side-channel webhook on success
//! 7. Build the envelope
//!
//! Every outcome, including transport failures, becomes an envelope. Nothing
//! panics or escapes to the framework.

use std::collections::HashMap;

use axum::{
    extract::{rejection::QueryRejection, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use formgate_core::{
    envelope::upstream_error_message, inbound, translate, validate, EndpointSpec, Envelope,
    GatewayError, JsonMap, Method, Mode, StatusPolicy,
};
use formgate_upstream::{endpoint_url, UpstreamCall, UpstreamResponse};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    bot_gate,
    response::{ApiError, JsonEnvelope},
    AppState,
};

/// Upstream body field never forwarded to side channels.
const CHALLENGE_TOKEN_FIELD: &str = "turnstile_token";

/// Handles one request for `spec`.
#[instrument(name = "gateway", skip_all, fields(endpoint = spec.name))]
pub async fn handle(
    state: AppState,
    spec: &'static EndpointSpec,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let query = query.map(|Query(params)| params).unwrap_or_default();

    match run(&state, spec, query, &headers, &body).await {
        Ok(envelope) => {
            info!(status = envelope.status.as_u16(), "Request forwarded");
            JsonEnvelope(envelope).into_response()
        },
        Err(e) => {
            match &e {
                GatewayError::Validation { .. }
                | GatewayError::BotVerification
                | GatewayError::Unauthorized => info!(kind = e.kind(), "Request rejected: {}", e),
                GatewayError::Upstream { .. } => {
                    warn!(kind = e.kind(), "Upstream refused request: {}", e);
                },
                GatewayError::Transport { .. } => {
                    error!(kind = e.kind(), "Upstream unreachable: {}", e);
                },
            }
            ApiError(e).into_response()
        },
    }
}

async fn run(
    state: &AppState,
    spec: &'static EndpointSpec,
    query: HashMap<String, String>,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Envelope, GatewayError> {
    let input = match spec.method {
        Method::Get => Some(inbound::from_query(query)),
        Method::Post => inbound::parse_body(body),
    };

    validate(input.as_ref(), spec.rules).map_err(|failure| {
        debug!(field = failure.field(), "Validation failed");
        GatewayError::validation(spec.invalid_message)
    })?;
    let input = input.unwrap_or_default();

    bot_gate::check(state, spec, headers, &input).await?;

    let payload = match spec.method {
        Method::Get => None,
        Method::Post => Some(translate(&input, spec)),
    };
    let notification = spec.notify.and(payload.as_ref()).map(notification_payload);

    let response = send(state, spec, &input, payload).await?;

    if !response.is_success() {
        let message = upstream_error_message(&response.body, spec.default_error);
        let status = match spec.status_policy {
            StatusPolicy::Mirror => response.status,
            StatusPolicy::Gateway => StatusCode::BAD_GATEWAY,
        };
        return Err(GatewayError::upstream(status, message));
    }

    let mut envelope = Envelope::success(response.status, response.body);

    if let (Some(notify), Some(notification)) = (spec.notify, notification) {
        let delivered = state.notifier.notify(state.webhook(notify), &notification).await;
        debug!(channel = notify.result_key(), delivered, "Side-channel webhook finished");
        envelope = envelope.with_field(notify.result_key(), delivered);
    }

    Ok(envelope)
}

/// Sends the upstream call, trying further base URLs on transport failure
/// when the endpoint fails over.
async fn send(
    state: &AppState,
    spec: &EndpointSpec,
    input: &JsonMap,
    payload: Option<JsonMap>,
) -> Result<UpstreamResponse, GatewayError> {
    let candidates = match spec.mode {
        Mode::Failover => &state.base_urls[..],
        Mode::Proxy | Mode::Degrade => &state.base_urls[..state.base_urls.len().min(1)],
    };

    let mut last_error = GatewayError::transport("no upstream base URL configured");

    for (attempt, base) in candidates.iter().enumerate() {
        let url = endpoint_url(base, &spec.upstream, input)
            .ok_or_else(|| GatewayError::validation(spec.invalid_message))?;

        let call = UpstreamCall {
            method: spec.method,
            url,
            body: payload.clone(),
            timeout: spec.timeout,
        };

        match state.upstream.forward(call).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                if attempt + 1 < candidates.len() {
                    warn!(base = %base, "Upstream candidate failed, trying next: {}", e);
                }
                last_error = e.into();
            },
        }
    }

    Err(last_error)
}

/// Body posted to side-channel webhooks: the forwarded entry without the
/// challenge token.
fn notification_payload(payload: &JsonMap) -> Value {
    let mut entry = payload.clone();
    entry.remove(CHALLENGE_TOKEN_FIELD);
    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn notification_drops_challenge_token() {
        let payload = json!({"email": "a@b.c", "leadMagnet": null, "turnstile_token": "t"});
        let entry = notification_payload(payload.as_object().unwrap());
        assert_eq!(entry, json!({"email": "a@b.c", "leadMagnet": null}));
    }
}
