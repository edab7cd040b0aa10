pub mod authz;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod utils;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::authz::{AreaPolicy, ConventionTable, PolicyRegistry, PolicyRequirement};
use crate::config::PortalConfig;
use crate::services::{Directory, TokenService};

/// Role carried by coordinator accounts.
pub const COORDINATOR_ROLE: &str = "coordinator";
/// Policy protecting the school management area.
pub const COORDINATORS_ONLY_POLICY: &str = "coordinators_only";
/// Route segment of the school management area.
pub const SCHOOL_MANAGEMENT_AREA: &str = "school-management";

#[derive(Clone)]
pub struct AppState {
    pub config: PortalConfig,
    pub conventions: Arc<ConventionTable>,
    pub policies: Arc<PolicyRegistry>,
    pub tokens: TokenService,
    pub directory: Arc<dyn Directory>,
}

/// Register the portal's named policies.
pub fn build_policy_registry() -> PolicyRegistry {
    let mut registry = PolicyRegistry::new();
    registry.register(
        COORDINATORS_ONLY_POLICY,
        PolicyRequirement::RequireRole(COORDINATOR_ROLE.to_string()),
    );
    registry
}

/// Apply the portal's area conventions, validating every referenced policy.
///
/// # Errors
///
/// Fails when a convention names an unregistered policy; callers must treat
/// this as fatal and refuse to start serving.
pub fn build_conventions(registry: &PolicyRegistry) -> Result<ConventionTable, AppError> {
    let mut table = ConventionTable::new();
    table
        .apply(
            AreaPolicy::new(SCHOOL_MANAGEMENT_AREA, "/", COORDINATORS_ONLY_POLICY),
            registry,
        )
        .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
    Ok(table)
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .filter_map(|origin| {
                    origin
                        .parse::<axum::http::HeaderValue>()
                        .map_err(|e| {
                            tracing::error!(origin = %origin, error = %e, "Invalid CORS origin, skipping");
                        })
                        .ok()
                })
                .collect::<Vec<axum::http::HeaderValue>>(),
        )
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/", get(handlers::catalog::home))
        .route("/health", get(health_check))
        .route("/auth/token", post(handlers::auth::issue_token))
        .route("/auth/introspect", post(handlers::auth::introspect))
        // School management area pages; protected by the area convention,
        // not by per-route layers.
        .route(
            "/school-management",
            get(handlers::school_management::dashboard),
        )
        .route(
            "/school-management/teachers",
            get(handlers::school_management::teachers),
        )
        .route(
            "/school-management/courses",
            post(handlers::school_management::create_course),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::area_policy_middleware,
        ))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(service_core::middleware::tracing::REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

/// Service health check
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    }))
}
