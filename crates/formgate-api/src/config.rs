//! Configuration management for the formgate gateway.

use std::{collections::BTreeMap, env, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use formgate_upstream::{ClientConfig, VerifierConfig, WebhookTarget, DEFAULT_VERIFY_URL};
use reqwest::Url;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "formgate.toml";

/// String-typed keys, read verbatim from the environment. Figment's `Env`
/// parses values, which turns a secret like `0042` into the integer 42.
const STRING_KEYS: &[&str] = &[
    "host",
    "api_internal_url",
    "api_url",
    "internal_api_token",
    "turnstile_secret_key",
    "turnstile_verify_url",
    "turnstile_bypass_token",
    "rate_limit_token",
    "revalidation_secret",
    "crm_webhook_url",
    "crm_webhook_token",
    "automation_webhook_url",
    "automation_webhook_token",
    "rust_log",
];

/// Base URL used when neither `API_INTERNAL_URL` nor `API_URL` is set.
pub const DEFAULT_API_URL: &str = "http://localhost:8001";

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`formgate.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Secrets default to unset. An empty string is treated the same as unset,
/// so `TURNSTILE_SECRET_KEY=` disables verification rather than enabling it
/// with an empty key.
///
/// # Example
///
/// ```no_run
/// use formgate_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Gateway will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// Budget for a whole upstream call, in seconds. Expiry answers 502.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Upstream
    /// Upstream base URL on the private network; preferred.
    ///
    /// Environment variable: `API_INTERNAL_URL`
    #[serde(default, alias = "API_INTERNAL_URL")]
    pub api_internal_url: Option<String>,
    /// Public upstream base URL.
    ///
    /// Environment variable: `API_URL`
    #[serde(default, alias = "API_URL")]
    pub api_url: Option<String>,
    /// Shared secret sent upstream as `x-internal-token`.
    ///
    /// Environment variable: `INTERNAL_API_TOKEN`
    #[serde(default, alias = "INTERNAL_API_TOKEN")]
    pub internal_api_token: Option<String>,

    // Bot verification
    /// Turnstile secret key. Unset disables verification.
    ///
    /// Environment variable: `TURNSTILE_SECRET_KEY`
    #[serde(default, alias = "TURNSTILE_SECRET_KEY")]
    pub turnstile_secret_key: Option<String>,
    /// Turnstile siteverify endpoint.
    ///
    /// Environment variable: `TURNSTILE_VERIFY_URL`
    #[serde(default = "default_verify_url", alias = "TURNSTILE_VERIFY_URL")]
    pub turnstile_verify_url: String,
    /// Secret that lets automated callers skip verification. Falls back to
    /// `INTERNAL_API_TOKEN`.
    ///
    /// Environment variable: `TURNSTILE_BYPASS_TOKEN`
    #[serde(default, alias = "TURNSTILE_BYPASS_TOKEN")]
    pub turnstile_bypass_token: Option<String>,

    // Access control
    /// Expected `x-rate-limit-token` value.
    ///
    /// Environment variable: `RATE_LIMIT_TOKEN`
    #[serde(default, alias = "RATE_LIMIT_TOKEN")]
    pub rate_limit_token: Option<String>,
    /// Secret for the page revalidation endpoint.
    ///
    /// Environment variable: `REVALIDATION_SECRET`
    #[serde(default, alias = "REVALIDATION_SECRET")]
    pub revalidation_secret: Option<String>,

    // Side channels
    /// CRM webhook for new leads.
    ///
    /// Environment variable: `CRM_WEBHOOK_URL`
    #[serde(default, alias = "CRM_WEBHOOK_URL")]
    pub crm_webhook_url: Option<String>,
    /// Bearer token for the CRM webhook.
    ///
    /// Environment variable: `CRM_WEBHOOK_TOKEN`
    #[serde(default, alias = "CRM_WEBHOOK_TOKEN")]
    pub crm_webhook_token: Option<String>,
    /// Marketing automation webhook for newsletter signups.
    ///
    /// Environment variable: `AUTOMATION_WEBHOOK_URL`
    #[serde(default, alias = "AUTOMATION_WEBHOOK_URL")]
    pub automation_webhook_url: Option<String>,
    /// Bearer token for the automation webhook.
    ///
    /// Environment variable: `AUTOMATION_WEBHOOK_TOKEN`
    #[serde(default, alias = "AUTOMATION_WEBHOOK_TOKEN")]
    pub automation_webhook_token: Option<String>,

    // Logging
    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("").ignore(STRING_KEYS))
            .merge(Serialized::defaults(raw_env_strings()));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Upstream base URLs in preference order: internal, then public.
    ///
    /// Duplicates are removed. Falls back to [`DEFAULT_API_URL`] when neither
    /// is set.
    pub fn upstream_base_urls(&self) -> Result<Vec<Url>> {
        let mut urls: Vec<Url> = Vec::new();
        let candidates = [non_empty(&self.api_internal_url), non_empty(&self.api_url)];
        for raw in candidates.into_iter().flatten() {
            let url = parse_base_url(raw)?;
            if !urls.contains(&url) {
                urls.push(url);
            }
        }

        if urls.is_empty() {
            urls.push(parse_base_url(DEFAULT_API_URL)?);
        }
        Ok(urls)
    }

    /// Secret accepted for skipping bot verification.
    pub fn bypass_token(&self) -> Option<&str> {
        non_empty(&self.turnstile_bypass_token).or_else(|| non_empty(&self.internal_api_token))
    }

    /// Expected rate-limit token, if the guard is enabled.
    pub fn rate_limit_token(&self) -> Option<&str> {
        non_empty(&self.rate_limit_token)
    }

    /// Revalidation secret, if revalidation is enabled.
    pub fn revalidation_secret(&self) -> Option<&str> {
        non_empty(&self.revalidation_secret)
    }

    /// Server-side request budget.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Convert to the upstream client configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            internal_token: non_empty(&self.internal_api_token).map(String::from),
            request_timeout: self.request_timeout(),
            ..ClientConfig::default()
        }
    }

    /// Convert to the bot verifier configuration.
    pub fn to_verifier_config(&self) -> Result<VerifierConfig> {
        Ok(VerifierConfig {
            secret: non_empty(&self.turnstile_secret_key).map(String::from),
            verify_url: parse_url("turnstile_verify_url", &self.turnstile_verify_url)?,
            timeout: Duration::from_secs(10),
        })
    }

    /// CRM webhook target, if configured.
    pub fn crm_webhook(&self) -> Result<Option<WebhookTarget>> {
        webhook_target("crm_webhook_url", &self.crm_webhook_url, &self.crm_webhook_token)
    }

    /// Automation webhook target, if configured.
    pub fn automation_webhook(&self) -> Result<Option<WebhookTarget>> {
        webhook_target(
            "automation_webhook_url",
            &self.automation_webhook_url,
            &self.automation_webhook_token,
        )
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        self.upstream_base_urls()?;
        self.to_verifier_config()?;
        self.crm_webhook()?;
        self.automation_webhook()?;

        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| non_empty(v).map(|_| "***");
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("request_timeout", &self.request_timeout)
            .field("api_internal_url", &self.api_internal_url)
            .field("api_url", &self.api_url)
            .field("internal_api_token", &mask(&self.internal_api_token))
            .field("turnstile_secret_key", &mask(&self.turnstile_secret_key))
            .field("turnstile_verify_url", &self.turnstile_verify_url)
            .field("turnstile_bypass_token", &mask(&self.turnstile_bypass_token))
            .field("rate_limit_token", &mask(&self.rate_limit_token))
            .field("revalidation_secret", &mask(&self.revalidation_secret))
            .field("crm_webhook_url", &self.crm_webhook_url)
            .field("crm_webhook_token", &mask(&self.crm_webhook_token))
            .field("automation_webhook_url", &self.automation_webhook_url)
            .field("automation_webhook_token", &mask(&self.automation_webhook_token))
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            api_internal_url: None,
            api_url: None,
            internal_api_token: None,
            turnstile_secret_key: None,
            turnstile_verify_url: default_verify_url(),
            turnstile_bypass_token: None,
            rate_limit_token: None,
            revalidation_secret: None,
            crm_webhook_url: None,
            crm_webhook_token: None,
            automation_webhook_url: None,
            automation_webhook_token: None,
            rust_log: default_log_level(),
        }
    }
}

fn raw_env_strings() -> BTreeMap<&'static str, String> {
    STRING_KEYS
        .iter()
        .filter_map(|key| env::var(key.to_ascii_uppercase()).ok().map(|value| (*key, value)))
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_url(name: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("{name} is not a valid URL: {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("{name} must use http or https: {raw}");
    }
    Ok(url)
}

fn parse_base_url(raw: &str) -> Result<Url> {
    parse_url("upstream base URL", raw.trim_end_matches('/'))
}

fn webhook_target(
    name: &str,
    url: &Option<String>,
    token: &Option<String>,
) -> Result<Option<WebhookTarget>> {
    let Some(raw) = non_empty(url) else {
        return Ok(None);
    };

    Ok(Some(WebhookTarget {
        url: parse_url(name, raw)?,
        bearer_token: non_empty(token).map(String::from),
    }))
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_request_timeout() -> u64 {
    30
}

fn default_verify_url() -> String {
    DEFAULT_VERIFY_URL.to_string()
}

fn default_log_level() -> String {
    "info,formgate_api=debug,formgate_upstream=debug,tower_http=debug".to_string()
}
