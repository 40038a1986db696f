//! Soilwatch - backend for a soil health monitoring dashboard.
//!
//! # Overview
//!
//! Soilwatch sits between the dashboard client and the soil monitoring API.
//! It keeps the dashboard and waterlogging pages refreshed in the
//! background, assembles the other pages on request, and gates everything
//! behind a persisted session flag.
//!
//! # Configuration
//!
//! - `SOILWATCH_PORT` - Listen port (default: 3000)
//! - `SOILWATCH_API_URL` - Soil API base URL (default: `http://localhost:8000/api`)
//! - `SOILWATCH_DATABASE_URL` - Session store (default: `sqlite:soilwatch.db?mode=rwc`)
//! - `SOILWATCH_POLL_SECONDS` - Refresh period of polled pages (default: 30)
//! - `SOILWATCH_REQUEST_TIMEOUT_SECONDS` - Upstream request timeout (default: 10)

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use soilwatch::api::{AppState, router};
use soilwatch::client::SoilApiClient;
use soilwatch::config::Config;
use soilwatch::session::SqliteSessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("soilwatch=info".parse()?))
        .init();

    let config = Config::from_env()?;
    config.log_config();

    let store = SqliteSessionStore::new(&config.database_url).await?;
    info!("Session store initialized");

    let client = SoilApiClient::with_timeout(&config.api_url, config.request_timeout)?;
    let state = AppState::new(store.clone(), client);
    let pollers = state.start_polling(config.poll_interval);

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, api_url = %config.api_url, "Soilwatch is listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    pollers.shutdown().await;
    store.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
