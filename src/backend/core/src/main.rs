//! Lattice Server - Main entry point

use std::net::SocketAddr;
use std::sync::Arc;

use lattice_core::{
    api::{self, AppState},
    authz::PolicyEngine,
    config::Config,
    middleware::{AuthConfig, Authenticator},
    observability,
    store::Store,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load().map_err(|e| {
        anyhow::anyhow!("Could not load config (set LATTICE__AUTH__JWT_SECRET): {e}")
    })?;

    // Initialize observability
    observability::init(
        "lattice-server",
        config.observability.otlp_endpoint.as_deref(),
    )?;
    observability::metrics::install_recorder()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Lattice Server"
    );

    // Authenticator; an empty secret aborts startup rather than serving
    // unverifiable tokens.
    let authenticator = Authenticator::new(AuthConfig {
        jwt_secret: config.auth.jwt_secret.clone(),
        token_ttl_hours: config.auth.token_ttl_hours,
        leeway_secs: config.auth.leeway_secs,
        ..Default::default()
    })
    .map_err(|e| anyhow::anyhow!("Failed to initialize authenticator: {e}"))?;

    // Create app state
    let app_state = AppState {
        store: Store::new(),
        policy: PolicyEngine::new(),
        authenticator: Arc::new(authenticator),
    };

    // Build router
    let app = api::build_router(app_state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    observability::shutdown();
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
