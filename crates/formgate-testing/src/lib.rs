//! Test infrastructure for the formgate gateway.
//!
//! Provides a `TestEnv` with mocked upstream, verifier, and webhook servers,
//! a router wired against them, and helpers for driving requests through the
//! router without binding a socket.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex, Once};

use anyhow::{Context, Result};
use axum::{body::Body, Router};
use formgate_api::{create_router, AppState, Config, PageRevalidator};
use http::{header, HeaderMap, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::{
    matchers::{any, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub mod fixtures;

/// Turnstile secret configured in every test environment.
pub const TURNSTILE_SECRET: &str = "test-turnstile-secret";
/// Internal token sent upstream.
pub const INTERNAL_TOKEN: &str = "test-internal-token";
/// Bot-verification bypass secret.
pub const BYPASS_TOKEN: &str = "test-bypass-token";
/// Expected `x-rate-limit-token`.
pub const RATE_LIMIT_TOKEN: &str = "test-rate-limit-token";
/// Revalidation secret.
pub const REVALIDATION_SECRET: &str = "test-revalidation-secret";
/// Bearer token for the CRM webhook.
pub const CRM_TOKEN: &str = "test-crm-token";
/// Bearer token for the automation webhook.
pub const AUTOMATION_TOKEN: &str = "test-automation-token";

/// Path of the mocked siteverify endpoint.
pub const VERIFY_PATH: &str = "/turnstile/v0/siteverify";
/// Path of the mocked CRM webhook.
pub const CRM_WEBHOOK_PATH: &str = "/hooks/crm";
/// Path of the mocked automation webhook.
pub const AUTOMATION_WEBHOOK_PATH: &str = "/hooks/automation";

static TRACING: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; silent otherwise.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Test environment with every external dependency mocked.
///
/// All three mock servers verify their `expect` counts when the environment
/// is dropped.
pub struct TestEnv {
    /// Mock of the backend API.
    pub upstream: MockServer,
    /// Mock of the Turnstile siteverify service.
    pub verifier: MockServer,
    /// Mock hosting both side-channel webhooks.
    pub webhooks: MockServer,
    /// Records every revalidated path.
    pub revalidator: Arc<RecordingRevalidator>,
    config: Config,
}

impl TestEnv {
    /// Starts the mock servers and builds a configuration pointing at them.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Like [`TestEnv::new`], then applies `customize` to the configuration.
    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        init_tracing();

        let upstream = MockServer::start().await;
        let verifier = MockServer::start().await;
        let webhooks = MockServer::start().await;

        let mut config = Config {
            api_internal_url: Some(upstream.uri()),
            internal_api_token: Some(INTERNAL_TOKEN.to_string()),
            turnstile_secret_key: Some(TURNSTILE_SECRET.to_string()),
            turnstile_verify_url: format!("{}{}", verifier.uri(), VERIFY_PATH),
            turnstile_bypass_token: Some(BYPASS_TOKEN.to_string()),
            rate_limit_token: Some(RATE_LIMIT_TOKEN.to_string()),
            revalidation_secret: Some(REVALIDATION_SECRET.to_string()),
            crm_webhook_url: Some(format!("{}{}", webhooks.uri(), CRM_WEBHOOK_PATH)),
            crm_webhook_token: Some(CRM_TOKEN.to_string()),
            automation_webhook_url: Some(format!("{}{}", webhooks.uri(), AUTOMATION_WEBHOOK_PATH)),
            automation_webhook_token: Some(AUTOMATION_TOKEN.to_string()),
            ..Config::default()
        };
        customize(&mut config);

        Self { upstream, verifier, webhooks, revalidator: Arc::default(), config }
    }

    /// Configuration the router is built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds application state with the recording revalidator attached.
    pub fn state(&self) -> Result<AppState> {
        let revalidator: Arc<dyn PageRevalidator> = self.revalidator.clone();
        Ok(AppState::from_config(self.config.clone())?.with_revalidator(revalidator))
    }

    /// Builds the full router.
    pub fn router(&self) -> Result<Router> {
        Ok(create_router(self.state()?))
    }

    /// Sends a request through a freshly built router.
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router()?.oneshot(request).await.context("router call failed")?;
        TestResponse::from_response(response).await
    }

    /// `GET uri`.
    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        let request = Request::builder().method("GET").uri(uri).body(Body::empty())?;
        self.send(request).await
    }

    /// `POST uri` with a JSON body.
    pub async fn post_json(&self, uri: &str, body: &Value) -> Result<TestResponse> {
        self.post_json_with(uri, body, &[]).await
    }

    /// `POST uri` with a JSON body and extra headers.
    pub async fn post_json_with(
        &self,
        uri: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<TestResponse> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder.body(Body::from(serde_json::to_vec(body)?))?).await
    }

    /// `POST uri` with an arbitrary body and no content type.
    pub async fn post_raw(&self, uri: &str, body: impl Into<Body>) -> Result<TestResponse> {
        let request = Request::builder().method("POST").uri(uri).body(body.into())?;
        self.send(request).await
    }

    /// Mounts an upstream reply for `verb path`.
    pub async fn mock_upstream(&self, verb: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.upstream)
            .await;
    }

    /// Mounts an upstream reply that must be hit exactly `times` times.
    pub async fn expect_upstream(
        &self,
        verb: &str,
        route: &str,
        status: u16,
        body: Value,
        times: u64,
    ) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(times)
            .named(format!("{verb} {route}"))
            .mount(&self.upstream)
            .await;
    }

    /// Fails the test on drop if anything reaches the upstream.
    pub async fn expect_no_upstream_calls(&self) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .named("no upstream calls")
            .mount(&self.upstream)
            .await;
    }

    /// Requests the upstream mock has received so far.
    pub async fn upstream_requests(&self) -> Vec<wiremock::Request> {
        self.upstream.received_requests().await.unwrap_or_default()
    }

    /// JSON body of the most recent upstream request.
    pub async fn last_upstream_body(&self) -> Option<Value> {
        let requests = self.upstream_requests().await;
        requests.last().and_then(|request| serde_json::from_slice(&request.body).ok())
    }

    /// Verifier answers `{"success": true}`.
    pub async fn verifier_accepts(&self) {
        self.mock_verifier(json!({ "success": true })).await;
    }

    /// Verifier answers `{"success": false}`.
    pub async fn verifier_rejects(&self) {
        self.mock_verifier(json!({ "success": false, "error-codes": ["invalid-input-response"] }))
            .await;
    }

    /// Fails the test on drop if the verifier is called.
    pub async fn expect_no_verification(&self) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .named("no verification calls")
            .mount(&self.verifier)
            .await;
    }

    async fn mock_verifier(&self, reply: Value) {
        Mock::given(method("POST"))
            .and(path(VERIFY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .mount(&self.verifier)
            .await;
    }

    /// Mounts a webhook reply with `status`.
    pub async fn mock_webhook(&self, route: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.webhooks)
            .await;
    }

    /// Requests received by the webhook mock at `route`.
    pub async fn webhook_requests(&self, route: &str) -> Vec<wiremock::Request> {
        self.webhooks
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == route)
            .collect()
    }
}

/// Buffered router response.
#[derive(Debug)]
pub struct TestResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Parsed body. `Null` when empty, a string when not JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(response: axum::response::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("failed to read response body")?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(Self { status, headers, body })
    }

    /// Envelope `ok` flag.
    pub fn ok(&self) -> Option<bool> {
        self.body.get("ok").and_then(Value::as_bool)
    }

    /// Envelope `error` message.
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// Revalidator that records every requested path.
#[derive(Debug, Default)]
pub struct RecordingRevalidator {
    paths: Mutex<Vec<String>>,
}

impl RecordingRevalidator {
    /// Paths revalidated so far, in order.
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().map(|paths| paths.clone()).unwrap_or_default()
    }
}

impl PageRevalidator for RecordingRevalidator {
    fn revalidate(&self, path: &str) {
        if let Ok(mut paths) = self.paths.lock() {
            paths.push(path.to_string());
        }
    }
}

/// Base URL of a local port with nothing listening on it.
pub fn unused_local_url() -> Result<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(format!("http://127.0.0.1:{port}"))
}
