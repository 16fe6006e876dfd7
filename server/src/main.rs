#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use rollbase::{
    AuthService, config::ServerConfig, http::router, store::MemoryUserStore,
    time::SystemTimeSource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollbase=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: listen_port={}, token_ttl={}s, bcrypt_cost={}",
        config.listen_port,
        config.auth.token_ttl().as_secs(),
        config.auth.bcrypt_cost()
    );
    if config.jwt_secret_generated {
        tracing::warn!(
            "ROLLBASE_JWT_SECRET is not set; using a generated secret. Tokens will not survive a restart."
        );
    }

    // Hashes a dummy password at the configured cost, so this is the first
    // place a bad cost would surface.
    let service = match AuthService::new(
        &config.auth,
        Arc::new(MemoryUserStore::new()),
        Arc::new(SystemTimeSource),
    ) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("Failed to initialize auth service: {e}");
            std::process::exit(1);
        }
    };

    let app = router(service);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Server error: {e}");
            std::process::exit(1);
        });

    tracing::info!("server stopped");
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
