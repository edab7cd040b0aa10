//! Test helpers for portal-service integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use portal_service::{
    build_conventions, build_policy_registry, build_router,
    config::{BootstrapConfig, Environment, PortalConfig, SecurityConfig, TokenConfig},
    services::{InMemoryDirectory, Password, TokenService},
    AppState, COORDINATOR_ROLE,
};
use secrecy::SecretString;
use std::sync::Arc;

pub const TEST_SECRET: &str = "integration-test-signing-secret-0123456789";
pub const COORDINATOR_USERNAME: &str = "w.pratt";
pub const COORDINATOR_PASSWORD: &str = "C00rdinate!42";
pub const TEACHER_USERNAME: &str = "j.ellis";
pub const TEACHER_PASSWORD: &str = "Te@cherPass77";

pub fn test_config() -> PortalConfig {
    PortalConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        environment: Environment::Dev,
        service_name: "portal-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        token: TokenConfig {
            secret: SecretString::new(TEST_SECRET.to_string()),
            lifetime_minutes: 60,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        bootstrap: BootstrapConfig {
            coordinator_username: COORDINATOR_USERNAME.to_string(),
            coordinator_password: SecretString::new(COORDINATOR_PASSWORD.to_string()),
        },
    }
}

/// Build the full application router plus the state behind it.
///
/// The directory holds one coordinator and one teacher so tests can cover
/// both sides of the coordinators-only policy.
pub fn spawn_app() -> (Router, AppState) {
    let config = test_config();

    let policies = build_policy_registry();
    let conventions = build_conventions(&policies).expect("conventions should apply");
    let tokens = TokenService::new(&config.token).expect("token service should build");

    let mut directory = InMemoryDirectory::new();
    directory
        .add_account(
            COORDINATOR_USERNAME,
            "Wendy Pratt",
            &Password::new(COORDINATOR_PASSWORD.to_string()),
            vec![COORDINATOR_ROLE.to_string()],
        )
        .expect("coordinator account");
    directory
        .add_account(
            TEACHER_USERNAME,
            "James Ellis",
            &Password::new(TEACHER_PASSWORD.to_string()),
            vec!["teacher".to_string()],
        )
        .expect("teacher account");

    let state = AppState {
        config,
        conventions: Arc::new(conventions),
        policies: Arc::new(policies),
        tokens,
        directory: Arc::new(directory),
    };

    (build_router(state.clone()), state)
}

/// Mint a token directly from the state's token service.
pub fn mint_token(state: &AppState, subject: &str, name: &str, roles: &[&str]) -> String {
    state
        .tokens
        .issue(
            subject,
            name,
            roles.iter().map(|r| r.to_string()).collect(),
        )
        .expect("token should issue")
        .access_token
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

pub fn authed_get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .expect("request should build")
}

pub fn json_post_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
