//! Integration tests for on-demand page revalidation.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use formgate_testing::{TestEnv, REVALIDATION_SECRET};
use serde_json::json;

#[tokio::test]
async fn valid_secret_revalidates_requested_path() {
    let env = TestEnv::new().await;

    let uri = format!("/api/revalidate?secret={REVALIDATION_SECRET}");
    let response = env.post_json(&uri, &json!({ "path": "/pricing" })).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "revalidated": true, "path": "/pricing" }));
    assert_eq!(env.revalidator.paths(), vec!["/pricing".to_string()]);
}

#[tokio::test]
async fn path_defaults_to_root() {
    let env = TestEnv::new().await;

    let uri = format!("/api/revalidate?secret={REVALIDATION_SECRET}");
    let response = env.post_raw(&uri, "").await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["path"], "/");
    assert_eq!(env.revalidator.paths(), vec!["/".to_string()]);
}

#[tokio::test]
async fn wrong_or_missing_secret_is_rejected() {
    let env = TestEnv::new().await;

    for uri in ["/api/revalidate?secret=nope", "/api/revalidate"] {
        let response = env.post_json(uri, &json!({ "path": "/pricing" })).await.unwrap();

        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.body, json!({ "message": "Invalid secret" }));
    }
    assert!(env.revalidator.paths().is_empty());
}

#[tokio::test]
async fn unset_secret_rejects_everything() {
    let env = TestEnv::with_config(|config| config.revalidation_secret = None).await;

    let response = env.post_json("/api/revalidate?secret=", &json!({})).await.unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(env.revalidator.paths().is_empty());
}
