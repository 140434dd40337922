//! audio-relay-gateway server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket relay and REST endpoints.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use audio_relay_gateway::app_state::AppState;
use audio_relay_gateway::config::{LogFormat, RelayConfig};
use audio_relay_gateway::server::build_app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RelayConfig::from_env().context("invalid listen address")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let listen_addr = config.listen_addr;
    tracing::info!(
        addr = %listen_addr,
        origin = config.allowed_origin.as_deref().unwrap_or("*"),
        queue = config.outbound_queue_capacity,
        "starting audio-relay-gateway"
    );

    let app = build_app(AppState::new(config));

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
