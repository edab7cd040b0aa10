use portal_service::{
    build_conventions, build_policy_registry, build_router,
    config::PortalConfig,
    services::{InMemoryDirectory, Password, TokenService},
    AppState, COORDINATOR_ROLE,
};
use secrecy::ExposeSecret;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = PortalConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting school portal service"
    );

    // Named policies first, then the conventions that reference them. A
    // convention naming an unregistered policy aborts startup here.
    let policies = build_policy_registry();
    let conventions = build_conventions(&policies)?;
    tracing::info!(rules = conventions.len(), "Area conventions applied");

    let tokens = TokenService::new(&config.token).map_err(service_core::error::AppError::ConfigError)?;

    // Seed the bootstrap coordinator so a fresh deployment can sign in.
    let mut directory = InMemoryDirectory::new();
    directory.add_account(
        &config.bootstrap.coordinator_username,
        "Bootstrap Coordinator",
        &Password::new(config.bootstrap.coordinator_password.expose_secret().clone()),
        vec![COORDINATOR_ROLE.to_string()],
    )?;
    tracing::info!(
        username = %config.bootstrap.coordinator_username,
        "Bootstrap coordinator account seeded"
    );

    let state = AppState {
        config: config.clone(),
        conventions: Arc::new(conventions),
        policies: Arc::new(policies),
        tokens,
        directory: Arc::new(directory),
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.common.host, config.common.port)
        .parse()
        .map_err(|e| {
            service_core::error::AppError::ConfigError(anyhow::anyhow!(
                "Invalid listen address: {}",
                e
            ))
        })?;
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
