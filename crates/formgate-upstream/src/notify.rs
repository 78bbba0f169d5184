//! Best-effort side-channel webhooks (CRM, marketing automation).
//!
//! Delivery failures are reported as `false`, never as errors: the primary
//! upstream call has already succeeded by the time a webhook fires.

use std::{fmt, time::Duration};

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info_span, warn, Instrument};

use crate::error::{Result, UpstreamError};

/// Destination of a side-channel webhook.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    /// Webhook URL.
    pub url: Url,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub bearer_token: Option<String>,
}

impl fmt::Debug for WebhookTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookTarget")
            .field("url", &self.url.as_str())
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Posts JSON payloads to webhook targets.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Creates a notifier whose calls are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                UpstreamError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }

    /// Delivers `payload`. Returns whether the target answered 2xx.
    ///
    /// An unconfigured target is reported as not delivered.
    pub async fn notify(&self, target: Option<&WebhookTarget>, payload: &Value) -> bool {
        let Some(target) = target else {
            return false;
        };

        let span = info_span!("webhook_notify", url = %target.url);
        async move {
            let mut request = self.client.post(target.url.clone()).json(payload);
            if let Some(token) = &target.bearer_token {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(status = response.status().as_u16(), "Webhook delivered");
                    true
                },
                Ok(response) => {
                    warn!(status = response.status().as_u16(), "Webhook rejected payload");
                    false
                },
                Err(e) => {
                    warn!("Webhook delivery failed: {}", e);
                    false
                },
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;

    fn target(server: &MockServer, token: Option<&str>) -> WebhookTarget {
        WebhookTarget {
            url: Url::parse(&format!("{}/hook", server.uri())).unwrap(),
            bearer_token: token.map(String::from),
        }
    }

    #[tokio::test]
    async fn delivers_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/hook"))
            .and(matchers::header("authorization", "Bearer crm-token"))
            .and(matchers::body_json(json!({"email": "a@b.c"})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(Duration::from_secs(5)).unwrap();
        let hook = target(&server, Some("crm-token"));
        let delivered = notifier.notify(Some(&hook), &json!({"email": "a@b.c"})).await;

        assert!(delivered);
    }

    #[tokio::test]
    async fn rejection_is_not_delivered() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(Duration::from_secs(5)).unwrap();
        assert!(!notifier.notify(Some(&target(&server, None)), &json!({})).await);
    }

    #[tokio::test]
    async fn unconfigured_target_is_not_delivered() {
        let notifier = WebhookNotifier::new(Duration::from_secs(5)).unwrap();
        assert!(!notifier.notify(None, &json!({})).await);
    }
}
