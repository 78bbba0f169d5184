//! formgate HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use formgate_core::Notify;
use formgate_upstream::{ChallengeVerifier, UpstreamClient, WebhookNotifier, WebhookTarget};
use reqwest::Url;

pub mod bot_gate;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use config::Config;
pub use handlers::revalidate::{LoggingRevalidator, PageRevalidator};
pub use server::{create_router, start_server};

/// Budget for side-channel webhook calls.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared, immutable state handed to every handler.
///
/// Built once at startup. Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Upstream API client.
    pub upstream: UpstreamClient,
    /// Bot challenge verifier.
    pub verifier: ChallengeVerifier,
    /// Side-channel webhook client.
    pub notifier: WebhookNotifier,
    /// Page cache invalidation hook.
    pub revalidator: Arc<dyn PageRevalidator>,
    /// Upstream base URLs, preferred first. Never empty.
    pub base_urls: Arc<[Url]>,
    crm_webhook: Option<Arc<WebhookTarget>>,
    automation_webhook: Option<Arc<WebhookTarget>>,
}

impl AppState {
    /// Builds clients and resolved URLs from configuration.
    ///
    /// # Errors
    ///
    /// Fails if a configured URL is invalid or an HTTP client cannot be built.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;

        let upstream = UpstreamClient::new(config.to_client_config())
            .context("Failed to build upstream client")?;
        let verifier = ChallengeVerifier::new(config.to_verifier_config()?)
            .context("Failed to build bot verifier")?;
        let notifier =
            WebhookNotifier::new(WEBHOOK_TIMEOUT).context("Failed to build webhook client")?;

        Ok(Self {
            upstream,
            verifier,
            notifier,
            revalidator: Arc::new(LoggingRevalidator),
            base_urls: config.upstream_base_urls()?.into(),
            crm_webhook: config.crm_webhook()?.map(Arc::new),
            automation_webhook: config.automation_webhook()?.map(Arc::new),
            config: Arc::new(config),
        })
    }

    /// Replaces the page revalidator.
    #[must_use]
    pub fn with_revalidator(mut self, revalidator: Arc<dyn PageRevalidator>) -> Self {
        self.revalidator = revalidator;
        self
    }

    /// Webhook target for a side channel, if configured.
    pub fn webhook(&self, notify: Notify) -> Option<&WebhookTarget> {
        match notify {
            Notify::Crm => self.crm_webhook.as_deref(),
            Notify::Automation => self.automation_webhook.as_deref(),
        }
    }
}
