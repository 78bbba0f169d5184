//! Integration tests for the bot gate.
//!
//! Covers challenge verification against the mocked siteverify service, the
//! three bypass credential locations, and fail-open when no secret is set.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use formgate_testing::{
    fixtures, unused_local_url, TestEnv, BYPASS_TOKEN, INTERNAL_TOKEN, TURNSTILE_SECRET,
    VERIFY_PATH,
};
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, ResponseTemplate,
};

fn without_token(route: &str) -> Value {
    let mut body = fixtures::valid_body(route).unwrap();
    body.as_object_mut().unwrap().remove("turnstileToken");
    body
}

#[tokio::test]
async fn accepted_challenge_is_forwarded_with_token() {
    let env = TestEnv::new().await;
    Mock::given(method("POST"))
        .and(path(VERIFY_PATH))
        .and(body_string_contains(format!("secret={TURNSTILE_SECRET}")))
        .and(body_string_contains(format!("response={}", fixtures::CHALLENGE_TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&env.verifier)
        .await;
    env.expect_upstream("POST", "/public/chat", 200, json!({ "id": 1 }), 1).await;

    let response =
        env.post_json("/api/chat", &fixtures::valid_body("/api/chat").unwrap()).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.ok(), Some(true));

    let forwarded = env.last_upstream_body().await.unwrap();
    assert_eq!(forwarded["turnstile_token"], fixtures::CHALLENGE_TOKEN);
}

#[tokio::test]
async fn rejected_challenge_returns_400() {
    let env = TestEnv::new().await;
    env.verifier_rejects().await;
    env.expect_no_upstream_calls().await;

    let response = env
        .post_json("/api/newsletter", &fixtures::valid_body("/api/newsletter").unwrap())
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "ok": false, "error": "Bot verification failed." }));
}

#[tokio::test]
async fn missing_token_fails_without_calling_verifier() {
    let env = TestEnv::new().await;
    env.expect_no_verification().await;
    env.expect_no_upstream_calls().await;

    let response = env.post_json("/api/chat", &without_token("/api/chat")).await.unwrap();

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), Some("Bot verification failed."));
}

#[tokio::test]
async fn unreachable_verifier_fails_closed() {
    let dead = unused_local_url().unwrap();
    let env = TestEnv::with_config(|config| {
        config.turnstile_verify_url = format!("{dead}{VERIFY_PATH}");
    })
    .await;
    env.expect_no_upstream_calls().await;

    let response = env
        .post_json(
            "/api/consultation/book",
            &fixtures::valid_body("/api/consultation/book").unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), Some("Bot verification failed."));
}

#[tokio::test]
async fn verifier_error_status_fails_closed() {
    let env = TestEnv::new().await;
    Mock::given(method("POST"))
        .and(path(VERIFY_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&env.verifier)
        .await;
    env.expect_no_upstream_calls().await;

    let response = env
        .post_json(
            "/api/lead-potential/calculate",
            &fixtures::valid_body("/api/lead-potential/calculate").unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn no_secret_configured_fails_open() {
    let env = TestEnv::with_config(|config| config.turnstile_secret_key = None).await;
    env.expect_no_verification().await;
    env.expect_upstream("POST", "/public/chat", 200, json!({}), 1).await;

    let response = env.post_json("/api/chat", &without_token("/api/chat")).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "ok": true }));
}

#[tokio::test]
async fn empty_secret_counts_as_unset() {
    let env =
        TestEnv::with_config(|config| config.turnstile_secret_key = Some(String::new())).await;
    env.expect_no_verification().await;
    env.mock_upstream("POST", "/public/competitor/compare", 200, json!({ "score": 71 })).await;

    let response = env
        .post_json("/api/competitor/compare", &without_token("/api/competitor/compare"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["score"], 71);
}

#[tokio::test]
async fn bypass_header_skips_verification() {
    let env = TestEnv::new().await;
    env.expect_no_verification().await;
    env.expect_upstream("POST", "/public/bug-reports", 201, json!({ "id": "b-1" }), 1).await;

    let response = env
        .post_json_with(
            "/api/bug-report",
            &without_token("/api/bug-report"),
            &[("x-internal-token", BYPASS_TOKEN)],
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body, json!({ "ok": true, "id": "b-1" }));
}

#[tokio::test]
async fn bypass_cookie_skips_verification() {
    let env = TestEnv::new().await;
    env.expect_no_verification().await;
    env.expect_upstream("POST", "/public/intelligence/report", 200, json!({}), 1).await;

    let cookie = format!("theme=dark; cg_internal={BYPASS_TOKEN}");
    let response = env
        .post_json_with(
            "/api/intelligence/report",
            &without_token("/api/intelligence/report"),
            &[("cookie", cookie.as_str())],
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn bypass_token_in_body_skips_verification() {
    let env = TestEnv::new().await;
    env.expect_no_verification().await;
    env.expect_upstream("POST", "/public/keyword-research/research", 200, json!({}), 1).await;

    let body = json!({ "seedKeyword": "roofing", "turnstileToken": BYPASS_TOKEN });
    let response = env.post_json("/api/keyword-research/research", &body).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn bypass_falls_back_to_internal_token() {
    let env = TestEnv::with_config(|config| config.turnstile_bypass_token = None).await;
    env.expect_no_verification().await;
    env.expect_upstream("POST", "/public/content/generate", 200, json!({}), 1).await;

    let response = env
        .post_json_with(
            "/api/content/generate",
            &without_token("/api/content/generate"),
            &[("x-internal-token", INTERNAL_TOKEN)],
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_bypass_credential_is_verified_normally() {
    let env = TestEnv::new().await;
    env.verifier_rejects().await;
    env.expect_no_upstream_calls().await;

    let response = env
        .post_json_with(
            "/api/chat/ai",
            &fixtures::valid_body("/api/chat/ai").unwrap(),
            &[("x-internal-token", "guess")],
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), Some("Bot verification failed."));
}

#[tokio::test]
async fn strict_endpoints_ignore_bypass_credentials() {
    let env = TestEnv::new().await;
    env.expect_no_verification().await;
    env.expect_no_upstream_calls().await;

    let response = env
        .post_json_with(
            "/api/chat",
            &without_token("/api/chat"),
            &[("x-internal-token", BYPASS_TOKEN)],
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), Some("Bot verification failed."));
}

#[tokio::test]
async fn payment_endpoints_skip_bot_check() {
    let env = TestEnv::new().await;
    env.expect_no_verification().await;
    env.mock_upstream(
        "POST",
        "/public/stripe/payment-intent",
        200,
        json!({ "client_secret": "pi_1" }),
    )
    .await;

    let response = env
        .post_json(
            "/api/stripe/payment-intent",
            &fixtures::valid_body("/api/stripe/payment-intent").unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["client_secret"], "pi_1");
}
