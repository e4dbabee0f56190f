//! Scan session endpoints.
//!
//! A scan runs one platform discovery per `POST`. Clients keep polling the
//! device and log collections at the intervals reported in [`ScanStatus`]
//! while the session is active.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use bluehack_core::{Device, ScanStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiResult;
use crate::state::SharedState;

/// Creates the scan router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(scan_status).post(start_scan).delete(stop_scan))
}

/// Outcome of a discovery request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanResponse {
    /// The discovered device, or `null` if the scan was stopped before
    /// the platform answered.
    #[schema(nullable)]
    pub device: Option<Device>,

    /// Session state after the discovery.
    pub status: ScanStatus,
}

/// Outcome of a stop request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StopScanResponse {
    /// `false` if no session was active.
    pub stopped: bool,

    /// Session state after stopping.
    pub status: ScanStatus,
}

/// Report the scan session state.
#[utoipa::path(
    get,
    path = "/api/scan",
    tag = "scan",
    operation_id = "scanStatus",
    summary = "Get scan session state",
    responses(
        (status = 200, description = "Current session state", body = ScanStatus)
    )
)]
pub async fn scan_status(State(state): State<SharedState>) -> Json<ScanStatus> {
    Json(state.scanner.status())
}

/// Run one device discovery.
#[utoipa::path(
    post,
    path = "/api/scan",
    tag = "scan",
    operation_id = "startScan",
    summary = "Discover a nearby device",
    description = "Asks the host Bluetooth stack for one nearby device. A found device is \
        recorded as active and a FOUND entry is written to the log. Failures are written \
        to the log as ERROR entries and end the session.",
    responses(
        (status = 200, description = "Discovery finished", body = ScanResponse),
        (status = 403, description = "Bluetooth access denied", body = crate::api::ErrorResponse),
        (status = 409, description = "No device selected, or a discovery is already running", body = crate::api::ErrorResponse),
        (status = 502, description = "Bluetooth stack error", body = crate::api::ErrorResponse),
        (status = 503, description = "Bluetooth not available on this host", body = crate::api::ErrorResponse)
    )
)]
pub async fn start_scan(State(state): State<SharedState>) -> ApiResult<Json<ScanResponse>> {
    let device = state.scanner.start().await?;
    Ok(Json(ScanResponse {
        device,
        status: state.scanner.status(),
    }))
}

/// End the scan session.
#[utoipa::path(
    delete,
    path = "/api/scan",
    tag = "scan",
    operation_id = "stopScan",
    summary = "Stop scanning",
    description = "Ends the session. A discovery still pending is discarded when it returns.",
    responses(
        (status = 200, description = "Session stopped", body = StopScanResponse)
    )
)]
pub async fn stop_scan(State(state): State<SharedState>) -> Json<StopScanResponse> {
    let stopped = state.scanner.stop().await;
    Json(StopScanResponse {
        stopped,
        status: state.scanner.status(),
    })
}
