//! Scan log endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use bluehack_core::{NewScanLog, ScanLog};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::api::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// Creates the logs router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(list_logs).post(create_log).delete(clear_logs))
}

/// Response after clearing the log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "message": "Logs cleared",
    "removed": 12
}))]
pub struct ClearLogsResponse {
    /// Confirmation text.
    #[schema(example = "Logs cleared")]
    pub message: String,

    /// How many entries were removed.
    #[schema(example = 12)]
    pub removed: usize,
}

/// List log entries, newest first.
#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "logs",
    operation_id = "listLogs",
    summary = "List scan log entries",
    responses(
        (status = 200, description = "Log entries, newest first", body = [ScanLog])
    )
)]
pub async fn list_logs(State(state): State<SharedState>) -> Json<Vec<ScanLog>> {
    Json(state.ingestor.logs().await)
}

/// Append a log entry.
#[utoipa::path(
    post,
    path = "/api/logs",
    tag = "logs",
    operation_id = "createLog",
    summary = "Append a scan log entry",
    description = "Stores the entry under the next id. Level must be one of \
        INFO, ERROR, SCAN, FOUND or INIT.",
    request_body = NewScanLog,
    responses(
        (status = 200, description = "Stored entry", body = ScanLog),
        (status = 400, description = "Malformed log payload", body = crate::api::ErrorResponse)
    )
)]
pub async fn create_log(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ScanLog>> {
    let Json(payload) = payload.map_err(|rejection| ApiError::invalid_body("log", &rejection))?;
    Ok(Json(state.ingestor.submit_log(payload).await?))
}

/// Remove every log entry.
#[utoipa::path(
    delete,
    path = "/api/logs",
    tag = "logs",
    operation_id = "clearLogs",
    summary = "Clear the scan log",
    description = "Empties the log. Clearing an empty log succeeds.",
    responses(
        (status = 200, description = "Log cleared", body = ClearLogsResponse)
    )
)]
pub async fn clear_logs(State(state): State<SharedState>) -> Json<ClearLogsResponse> {
    let removed = state.ingestor.clear_logs().await;
    Json(ClearLogsResponse {
        message: "Logs cleared".to_string(),
        removed,
    })
}
