//! Bot verification step of the gateway pipeline.

use axum::http::HeaderMap;
use formgate_core::{
    inbound, should_bypass, BotCheck, BypassCredentials, EndpointSpec, GatewayError, JsonMap,
};
use tracing::debug;

use crate::AppState;

/// Applies the endpoint's bot check.
///
/// Bypass credentials are consulted first where the endpoint allows them,
/// then the challenge token is verified.
///
/// # Errors
///
/// Returns `GatewayError::BotVerification` when the challenge is rejected.
pub async fn check(
    state: &AppState,
    spec: &EndpointSpec,
    headers: &HeaderMap,
    body: &JsonMap,
) -> Result<(), GatewayError> {
    let token = inbound::bot_token(Some(body));

    match spec.bot_check {
        BotCheck::Skip => return Ok(()),
        BotCheck::VerifyOrBypass => {
            let credentials = BypassCredentials::from_request(headers, token);
            if should_bypass(state.config.bypass_token(), &credentials) {
                debug!("Bypass credential accepted, skipping bot verification");
                return Ok(());
            }
        },
        BotCheck::Verify => {},
    }

    if state.verifier.verify(token).await {
        Ok(())
    } else {
        Err(GatewayError::BotVerification)
    }
}
