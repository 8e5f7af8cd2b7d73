//! # jsgate-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment
//! (see [`jsgate_api::state::AppConfig::from_env`]).

use jsgate_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {e}");
        e
    })?;
    let port = config.port;

    // Load and compile the schema directory before binding.
    let state = AppState::bootstrap(config).map_err(|e| {
        tracing::error!("Bootstrap failed: {e}");
        e
    })?;

    let app = jsgate_api::app(state).map_err(|e| {
        tracing::error!("Route schema failed to compile: {e}");
        e
    })?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("jsgate API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
