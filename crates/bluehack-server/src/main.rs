//! # bluehack-server
//!
//! HTTP server for the bluehack BLE discovery recorder.
//!
//! This binary provides:
//! - REST API for the device registry, scan log, exports and scan session
//! - OpenAPI document at `/api/openapi.json`
//! - Structured logging to file and stdout
//!
//! ## Running
//!
//! ```bash
//! # Development, no Bluetooth stack
//! cargo run --package bluehack-server
//!
//! # With BlueZ discovery
//! cargo run --package bluehack-server --features bluetooth
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::sync::Arc;

use anyhow::Context;
use bluehack_core::{Config, Discoverer};
use bluehack_server::{api, logging, state::AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    logging::init(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting bluehack-server");

    let addr = config.socket_addr()?;
    let discoverer = discoverer(&config);
    let state = AppState::new(config, discoverer);
    state.scanner.announce().await;

    let app = api::create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(feature = "bluetooth")]
fn discoverer(config: &Config) -> Arc<dyn Discoverer> {
    Arc::new(bluehack_core::BluezDiscoverer::new(config.scan.timeout()))
}

#[cfg(not(feature = "bluetooth"))]
fn discoverer(_config: &Config) -> Arc<dyn Discoverer> {
    tracing::warn!("Built without the `bluetooth` feature; scanning is unavailable");
    Arc::new(bluehack_core::UnsupportedDiscoverer)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
