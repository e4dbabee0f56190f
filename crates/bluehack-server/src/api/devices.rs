//! Device registry endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use bluehack_core::{Device, NewDevice};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// Creates the devices router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(list_devices).post(upsert_device))
}

/// List every known device, most recently seen first.
#[utoipa::path(
    get,
    path = "/api/devices",
    tag = "devices",
    operation_id = "listDevices",
    summary = "List discovered devices",
    description = "Returns all devices ordered by last-seen time, newest first. \
        Devices seen at the same instant keep the order in which they were first recorded.",
    responses(
        (status = 200, description = "Device list", body = [Device])
    )
)]
pub async fn list_devices(State(state): State<SharedState>) -> Json<Vec<Device>> {
    Json(state.ingestor.devices().await)
}

/// Record a device observation.
///
/// Creates a device for a new address or updates the existing record in
/// place, keeping its id.
#[utoipa::path(
    post,
    path = "/api/devices",
    tag = "devices",
    operation_id = "upsertDevice",
    summary = "Create or update a device",
    description = "Records a device observation. An unknown address creates a new record \
        with a fresh id; a known address overwrites the stored fields. Omitted `rssi` or \
        `services` keep their stored values.",
    request_body = NewDevice,
    responses(
        (status = 200, description = "Stored record", body = Device),
        (status = 400, description = "Malformed device payload", body = crate::api::ErrorResponse)
    )
)]
pub async fn upsert_device(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Device>> {
    let Json(payload) = payload.map_err(|rejection| ApiError::invalid_body("device", &rejection))?;
    let outcome = state.ingestor.submit_device(payload).await?;
    Ok(Json(outcome.into_device()))
}
