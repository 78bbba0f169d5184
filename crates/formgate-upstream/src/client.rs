//! HTTP client for the upstream backend API.
//!
//! Handles request construction, the optional per-call latency budget and
//! response body decoding. Upstream error statuses are returned as data so
//! the caller can pick their error text; only transport failures are errors.

use std::{
    fmt,
    time::{Duration, Instant},
};

use bytes::Bytes;
use formgate_core::{bypass::INTERNAL_TOKEN_HEADER, JsonMap, Method, UpstreamPath};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{info_span, Instrument};

use crate::error::{Result, UpstreamError};

/// Configuration for the upstream client.
#[derive(Clone)]
pub struct ClientConfig {
    /// User agent string for requests.
    pub user_agent: String,
    /// Budget for establishing a connection.
    pub connect_timeout: Duration,
    /// Default budget for a whole call, send through body read.
    pub request_timeout: Duration,
    /// Shared secret sent as `x-internal-token`.
    pub internal_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("formgate/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            internal_token: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("user_agent", &self.user_agent)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("internal_token", &self.internal_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A single outbound call.
#[derive(Debug, Clone)]
pub struct UpstreamCall {
    /// Method; POST calls carry a JSON body.
    pub method: Method,
    /// Absolute target URL.
    pub url: Url,
    /// JSON body for POST calls.
    pub body: Option<JsonMap>,
    /// Latency budget covering send and body read. Overrides the client's
    /// `request_timeout`.
    pub timeout: Option<Duration>,
}

impl UpstreamCall {
    /// Creates a GET call without a budget.
    pub fn get(url: Url) -> Self {
        Self { method: Method::Get, url, body: None, timeout: None }
    }

    /// Creates a POST call with a JSON body.
    pub fn post(url: Url, body: JsonMap) -> Self {
        Self { method: Method::Post, url, body: Some(body), timeout: None }
    }

    /// Sets the latency budget.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Reply from the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Decoded JSON body; `{}` when empty.
    pub body: Value,
    /// Time from send to body read.
    pub duration: Duration,
}

impl UpstreamResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Client for the upstream API.
///
/// Holds a single pooled `reqwest::Client`; cloning is cheap.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl UpstreamClient {
    /// Creates a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                UpstreamError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Sends a call and decodes the reply.
    ///
    /// # Errors
    ///
    /// - `Network` when the connection fails
    /// - `Timeout` when the call's budget, or the client's `request_timeout`,
    ///   expires; the request is dropped
    /// - `InvalidBody` when a 2xx reply is not JSON
    pub async fn forward(&self, call: UpstreamCall) -> Result<UpstreamResponse> {
        let span = info_span!("upstream_call", method = ?call.method, url = %call.url);

        async move {
            let start = Instant::now();
            let budget_ms = call
                .timeout
                .unwrap_or(self.config.request_timeout)
                .as_millis()
                .try_into()
                .unwrap_or(u64::MAX);

            let mut request = match call.method {
                Method::Get => self.client.get(call.url),
                Method::Post => {
                    self.client.post(call.url).json(&Value::Object(call.body.unwrap_or_default()))
                },
            };
            if let Some(token) = &self.config.internal_token {
                request = request.header(INTERNAL_TOKEN_HEADER, token);
            }

            let exchange = async {
                let response =
                    request.send().await.map_err(|e| UpstreamError::from_reqwest(&e, budget_ms))?;
                let status = response.status();
                let bytes =
                    response.bytes().await.map_err(|e| UpstreamError::from_reqwest(&e, budget_ms))?;
                Ok::<_, UpstreamError>((status, bytes))
            };

            let outcome = match call.timeout {
                Some(limit) => tokio::time::timeout(limit, exchange)
                    .await
                    .unwrap_or(Err(UpstreamError::timeout(budget_ms))),
                None => exchange.await,
            };

            let duration = start.elapsed();
            let (status, bytes) = match outcome {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(
                        duration_ms = duration.as_millis(),
                        "Upstream call failed: {}",
                        e
                    );
                    return Err(e);
                },
            };

            let body = decode_body(status, &bytes)?;

            if status.is_success() {
                tracing::debug!(
                    status = status.as_u16(),
                    duration_ms = duration.as_millis(),
                    "Upstream replied"
                );
            } else {
                tracing::warn!(
                    status = status.as_u16(),
                    duration_ms = duration.as_millis(),
                    "Upstream error response"
                );
            }

            Ok(UpstreamResponse { status, body, duration })
        }
        .instrument(span)
        .await
    }

    /// Checks reachability with a GET, ignoring the body.
    ///
    /// # Errors
    ///
    /// Returns a transport error if no response arrives within `budget`.
    pub async fn probe(&self, url: Url, budget: Duration) -> Result<StatusCode> {
        let budget_ms = budget.as_millis().try_into().unwrap_or(u64::MAX);
        let request = self.client.get(url).timeout(budget);

        match request.send().await {
            Ok(response) => Ok(response.status()),
            Err(e) => Err(UpstreamError::from_reqwest(&e, budget_ms)),
        }
    }
}

/// Decodes an upstream body.
///
/// Empty bodies read as `{}`. Unparseable bodies are tolerated on error
/// statuses, where only the error text is wanted.
fn decode_body(status: StatusCode, bytes: &Bytes) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(JsonMap::new()));
    }

    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => Ok(Value::Object(JsonMap::new())),
        Err(e) => Err(UpstreamError::invalid_body(e.to_string())),
    }
}

/// Joins an upstream path onto a base URL.
///
/// Parameter values are percent-encoded as single path segments. Returns
/// `None` if a parameter is missing or the base cannot carry a path.
pub fn endpoint_url(base: &Url, path: &UpstreamPath, input: &JsonMap) -> Option<Url> {
    let segments = path.render(input)?;
    let mut url = base.clone();
    url.path_segments_mut().ok()?.pop_if_empty().extend(segments.iter());
    Some(url)
}
