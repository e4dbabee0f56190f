//! HTTP API routes and handlers.
//!
//! This module contains all HTTP endpoint implementations organized by domain:
//! - `devices` - Device registry listing and upsert
//! - `logs` - Scan log journal
//! - `export` - JSON/CSV device downloads
//! - `scan` - Bluetooth discovery session
//! - `health` - Service health checks
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub mod devices;
pub mod error;
pub mod export;
pub mod health;
pub mod logs;
pub mod openapi;
pub mod scan;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use openapi::get_openapi_json;

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                - Health check
/// /api
/// ├── /devices           - List and upsert devices
/// ├── /logs              - List, append and clear log entries
/// ├── /export/devices    - JSON/CSV download
/// ├── /scan              - Scan session state, start, stop
/// └── /openapi.json      - OpenAPI specification
/// ```
pub fn create_router(state: SharedState) -> Router {
    let cors_permissive = state.config.server.cors_permissive;

    let router = Router::new()
        .nest("/health", health::router())
        .nest(
            "/api",
            Router::new()
                .nest("/devices", devices::router())
                .nest("/logs", logs::router())
                .route("/export/devices", get(export::export_devices))
                .nest("/scan", scan::router())
                .route("/openapi.json", get(openapi::get_openapi_spec)),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new()),
        );

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
