//! Health check handlers for service monitoring.
//!
//! Provides liveness, readiness, and health endpoints with an upstream
//! reachability check for orchestration systems like Kubernetes.

use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use formgate_core::{JsonMap, Segment, UpstreamPath};
use formgate_upstream::{endpoint_url, UpstreamClient};
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::AppState;

/// Budget for the upstream reachability probe.
const PROBE_BUDGET: Duration = Duration::from_secs(2);

const UPSTREAM_HEALTH_PATH: UpstreamPath = UpstreamPath(&[Segment::Literal("health")]);

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Individual component health checks
    pub checks: HealthChecks,
    /// Service version information
    pub version: String,
}

/// Overall health status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Upstream unreachable; validation and degraded endpoints still answer
    Degraded,
}

/// Individual component health check results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Upstream API reachability
    pub upstream: ComponentHealth,
}

/// Health status for individual components.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    /// Component status
    pub status: ComponentStatus,
    /// Optional error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

/// Component-level health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is healthy
    Up,
    /// Component is experiencing issues
    Down,
}

/// Health service probing the primary upstream base URL.
pub struct HealthService<'a> {
    upstream: &'a UpstreamClient,
    base: Option<&'a Url>,
}

impl<'a> HealthService<'a> {
    /// Creates a health service for the given client and base URL.
    pub fn new(upstream: &'a UpstreamClient, base: Option<&'a Url>) -> Self {
        Self { upstream, base }
    }

    /// Performs service health checks.
    pub async fn health_check(&self) -> HealthResponse {
        debug!("Performing health check");

        let timestamp = Utc::now();
        let start_time = Instant::now();
        let (status, message) = self.check_upstream().await;
        let elapsed = start_time.elapsed();

        let overall_status = match status {
            ComponentStatus::Up => HealthStatus::Healthy,
            ComponentStatus::Down => HealthStatus::Degraded,
        };

        HealthResponse {
            status: overall_status,
            timestamp,
            checks: HealthChecks {
                upstream: ComponentHealth {
                    status,
                    message,
                    response_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                },
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Probes `GET {base}/health`. Any 2xx counts as up.
    async fn check_upstream(&self) -> (ComponentStatus, Option<String>) {
        let Some(url) =
            self.base.and_then(|base| endpoint_url(base, &UPSTREAM_HEALTH_PATH, &JsonMap::new()))
        else {
            return (ComponentStatus::Down, Some("No upstream URL configured".to_string()));
        };

        match self.upstream.probe(url, PROBE_BUDGET).await {
            Ok(status) if status.is_success() => {
                debug!("Upstream health check passed");
                (ComponentStatus::Up, None)
            },
            Ok(status) => {
                warn!(status = status.as_u16(), "Upstream health check returned error status");
                (ComponentStatus::Down, Some(format!("Upstream returned HTTP {}", status.as_u16())))
            },
            Err(e) => {
                warn!("Upstream health check failed: {}", e);
                (ComponentStatus::Down, Some(format!("Upstream unreachable: {e}")))
            },
        }
    }
}

async fn run_health_check(state: &AppState) -> HealthResponse {
    HealthService::new(&state.upstream, state.base_urls.first()).health_check().await
}

/// Health check endpoint handler.
///
/// Degraded still answers 200: the gateway keeps validating and serving
/// degraded endpoints while the upstream is away.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let response = run_health_check(&state).await;

    debug!(
        status = ?response.status,
        upstream_status = ?response.checks.upstream.status,
        "Health check completed"
    );

    (StatusCode::OK, Json(response)).into_response()
}

/// Readiness check endpoint for Kubernetes probes.
///
/// Same probe as the health check, but reports 503 while the upstream is
/// unreachable so traffic is routed elsewhere.
#[instrument(name = "readiness_check", skip(state))]
pub async fn readiness_check(State(state): State<AppState>) -> Response {
    let response = run_health_check(&state).await;

    let status_code = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response)).into_response()
}

/// Liveness check endpoint for Kubernetes probes.
///
/// Returns a simple response indicating the service process is alive.
/// This is a minimal check that doesn't test external dependencies.
#[instrument(name = "liveness_check")]
pub async fn liveness_check() -> Response {
    debug!("Performing liveness check");

    let response = serde_json::json!({
        "status": "alive",
        "timestamp": Utc::now(),
        "service": "formgate"
    });

    (StatusCode::OK, Json(response)).into_response()
}
