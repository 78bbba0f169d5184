//! Bot challenge verification against Cloudflare Turnstile.
//!
//! Fails open when no secret is configured, so deployments without bot
//! protection keep working. Once a secret is set it fails closed: any error
//! talking to the verification service rejects the request.

use std::{fmt, time::Duration};

use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info_span, warn, Instrument};

use crate::error::{Result, UpstreamError};

/// Cloudflare's siteverify endpoint.
pub const DEFAULT_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Verification settings.
#[derive(Clone)]
pub struct VerifierConfig {
    /// Turnstile secret key; `None` disables verification.
    pub secret: Option<String>,
    /// Siteverify endpoint.
    pub verify_url: Url,
    /// Budget for the verification call.
    pub timeout: Duration,
}

impl fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .field("verify_url", &self.verify_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Client for the challenge verification service.
#[derive(Debug, Clone)]
pub struct ChallengeVerifier {
    client: reqwest::Client,
    config: VerifierConfig,
}

impl ChallengeVerifier {
    /// Creates a verifier.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(config: VerifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                UpstreamError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Whether a secret is configured.
    pub fn is_enabled(&self) -> bool {
        self.config.secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Verifies a challenge token.
    pub async fn verify(&self, token: Option<&str>) -> bool {
        let Some(secret) = self.config.secret.as_deref().filter(|s| !s.is_empty()) else {
            debug!("Bot verification disabled, accepting request");
            return true;
        };

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            debug!("Challenge token missing");
            return false;
        };

        let span = info_span!("bot_verification", url = %self.config.verify_url);
        async move {
            let response = match self
                .client
                .post(self.config.verify_url.clone())
                .form(&[("secret", secret), ("response", token)])
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!("Verification request failed: {}", e);
                    return false;
                },
            };

            match response.json::<SiteVerifyResponse>().await {
                Ok(reply) if reply.success => true,
                Ok(reply) => {
                    debug!(error_codes = ?reply.error_codes, "Challenge rejected");
                    false
                },
                Err(e) => {
                    warn!("Unreadable verification response: {}", e);
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
    use super::*;

    fn config(secret: Option<&str>) -> VerifierConfig {
        VerifierConfig {
            secret: secret.map(String::from),
            verify_url: Url::parse(DEFAULT_VERIFY_URL).unwrap(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn fails_open_without_secret() {
        let verifier = ChallengeVerifier::new(config(None)).unwrap();
        assert!(!verifier.is_enabled());
        assert!(verifier.verify(None).await);
        assert!(verifier.verify(Some("anything")).await);
    }

    #[tokio::test]
    async fn empty_secret_counts_as_unset() {
        let verifier = ChallengeVerifier::new(config(Some(""))).unwrap();
        assert!(!verifier.is_enabled());
        assert!(verifier.verify(None).await);
    }

    #[tokio::test]
    async fn missing_token_fails_without_network() {
        let verifier = ChallengeVerifier::new(config(Some("secret"))).unwrap();
        assert!(!verifier.verify(None).await);
        assert!(!verifier.verify(Some("")).await);
    }

    #[test]
    fn debug_masks_secret() {
        let rendered = format!("{:?}", config(Some("0x4AAA-secret")));
        assert!(!rendered.contains("0x4AAA-secret"));
    }
}
