//! Token issuance flow: credentials in, bearer token out, and the token's
//! parameters come straight from the configured settings.

mod common;

use axum::http::StatusCode;
use common::*;
use tower::util::ServiceExt;

#[tokio::test]
async fn test_valid_credentials_yield_a_token() {
    let (app, _state) = spawn_app();

    let response = app
        .oneshot(json_post_request(
            "/auth/token",
            serde_json::json!({
                "username": COORDINATOR_USERNAME,
                "password": COORDINATOR_PASSWORD,
            }),
        ))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(!body["access_token"]
        .as_str()
        .expect("access_token")
        .is_empty());
    assert_eq!(body["token_type"], "Bearer");
    // 60 configured minutes, reported in seconds, untransformed.
    assert_eq!(body["expires_in"], 3600);
}

#[tokio::test]
async fn test_issued_token_carries_account_claims() {
    let (app, state) = spawn_app();

    let response = app
        .oneshot(json_post_request(
            "/auth/token",
            serde_json::json!({
                "username": COORDINATOR_USERNAME,
                "password": COORDINATOR_PASSWORD,
            }),
        ))
        .await
        .expect("request should succeed");
    let body = body_json(response).await;
    let token = body["access_token"].as_str().expect("access_token");

    let claims = state.tokens.validate(token).expect("token should validate");
    assert_eq!(claims.sub, COORDINATOR_USERNAME);
    assert!(claims.has_role("coordinator"));
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn test_issued_token_opens_the_protected_area() {
    let (app, _state) = spawn_app();

    let response = app
        .clone()
        .oneshot(json_post_request(
            "/auth/token",
            serde_json::json!({
                "username": COORDINATOR_USERNAME,
                "password": COORDINATOR_PASSWORD,
            }),
        ))
        .await
        .expect("request should succeed");
    let body = body_json(response).await;
    let token = body["access_token"].as_str().expect("access_token");

    let response = app
        .oneshot(authed_get_request("/school-management", token))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let (app, _state) = spawn_app();

    let response = app
        .oneshot(json_post_request(
            "/auth/token",
            serde_json::json!({
                "username": COORDINATOR_USERNAME,
                "password": "wrong-password",
            }),
        ))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_user_is_unauthorized() {
    let (app, _state) = spawn_app();

    let response = app
        .oneshot(json_post_request(
            "/auth/token",
            serde_json::json!({
                "username": "nobody",
                "password": "whatever",
            }),
        ))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_username_fails_validation() {
    let (app, _state) = spawn_app();

    let response = app
        .oneshot(json_post_request(
            "/auth/token",
            serde_json::json!({
                "username": "",
                "password": "whatever",
            }),
        ))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (app, _state) = spawn_app();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/auth/token")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .expect("request should build");

    let response = app.oneshot(request).await.expect("request should succeed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_introspect_reports_active_token() {
    let (app, state) = spawn_app();
    let token = mint_token(&state, "w.pratt", "Wendy Pratt", &["coordinator"]);

    let response = app
        .oneshot(json_post_request(
            "/auth/introspect",
            serde_json::json!({"token": token}),
        ))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["active"], true);
    assert_eq!(body["sub"], "w.pratt");
}

#[tokio::test]
async fn test_introspect_reports_inactive_for_garbage() {
    let (app, _state) = spawn_app();

    let response = app
        .oneshot(json_post_request(
            "/auth/introspect",
            serde_json::json!({"token": "garbage"}),
        ))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["active"], false);
    assert!(body.get("sub").is_none());
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let (app, _state) = spawn_app();

    let response = app
        .oneshot(get_request("/health"))
        .await
        .expect("request should succeed");

    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response
            .headers()
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
}
