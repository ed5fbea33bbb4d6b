//! clubsync-elections server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use clubsync_elections::app_state::AppState;
use clubsync_elections::auth::StaticAuthenticator;
use clubsync_elections::config::{LogFormat, ServerConfig};
use clubsync_elections::domain::{EventBus, SystemClock};
use clubsync_elections::persistence::ElectionStore;
use clubsync_elections::server::build_app;
use clubsync_elections::service::{ElectionService, ResultsCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Load configuration
    let config = ServerConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.storage_backend,
        "starting clubsync-elections"
    );

    // Build persistence and domain layers
    let store = ElectionStore::connect(&config)
        .await
        .context("failed to initialise storage")?;
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build service layer
    let election_service = Arc::new(ElectionService::new(
        store,
        Arc::new(SystemClock),
        event_bus.clone(),
        ResultsCache::new(config.results_cache_ttl),
    ));

    // Build application state
    let app_state = AppState {
        election_service,
        event_bus,
        authenticator: Arc::new(StaticAuthenticator::new(config.auth_credentials.clone())),
    };

    let app = build_app(app_state, config.request_timeout);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Installs the global subscriber. `LOG_FORMAT=json` selects JSON lines;
/// `RUST_LOG` overrides the default `info` filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
