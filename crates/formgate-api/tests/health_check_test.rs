//! Health check endpoint tests.
//!
//! Tests the `/health`, `/ready` and `/live` endpoints, including the
//! upstream reachability probe and response formatting.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use formgate_testing::{unused_local_url, TestEnv};
use serde_json::json;

#[tokio::test]
async fn health_check_reports_healthy_upstream() {
    let env = TestEnv::new().await;
    env.mock_upstream("GET", "/health", 200, json!({ "status": "ok" })).await;

    let response = env.get("/health").await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["checks"]["upstream"]["status"], "up");
    assert!(response.body["checks"]["upstream"].get("message").is_none());
    assert!(response.body["version"].is_string());
    assert!(response.body["timestamp"].is_string());
}

#[tokio::test]
async fn health_check_stays_200_when_upstream_is_down() {
    let dead = unused_local_url().unwrap();
    let env = TestEnv::with_config(|config| config.api_internal_url = Some(dead)).await;

    let response = env.get("/health").await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "degraded");
    assert_eq!(response.body["checks"]["upstream"]["status"], "down");
    assert!(response.body["checks"]["upstream"]["message"].is_string());
}

#[tokio::test]
async fn readiness_probe_fails_while_upstream_errors() {
    let env = TestEnv::new().await;
    env.mock_upstream("GET", "/health", 503, json!({})).await;

    let response = env.get("/ready").await.unwrap();

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["status"], "degraded");
    assert_eq!(response.body["checks"]["upstream"]["message"], "Upstream returned HTTP 503");
}

#[tokio::test]
async fn readiness_probe_passes_when_upstream_is_up() {
    let env = TestEnv::new().await;
    env.mock_upstream("GET", "/health", 200, json!({})).await;

    let response = env.get("/ready").await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn liveness_never_touches_upstream() {
    let env = TestEnv::new().await;
    env.expect_no_upstream_calls().await;

    let response = env.get("/live").await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "alive");
    assert_eq!(response.body["service"], "formgate");
}
