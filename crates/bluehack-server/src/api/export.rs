//! Device export endpoint.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bluehack_core::ExportFormat;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::error::ApiResult;
use crate::state::SharedState;

/// Query parameters for the export endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ExportQuery {
    /// `csv` for a table; anything else, or nothing, yields JSON.
    #[param(example = "csv")]
    pub format: Option<String>,
}

/// Download the device collection as a file.
#[utoipa::path(
    get,
    path = "/api/export/devices",
    tag = "export",
    operation_id = "exportDevices",
    summary = "Export devices as JSON or CSV",
    description = "Returns the device collection, newest first, as a downloadable file. \
        `format=csv` produces a table with the header \
        `Name,Address,RSSI,Services,Last Seen,Status`; any other value produces a JSON array. \
        Exporting does not change any state.",
    params(ExportQuery),
    responses(
        (status = 200, description = "Device export file", content(
            (Vec<bluehack_core::Device> = "application/json"),
            (String = "text/csv")
        ))
    )
)]
pub async fn export_devices(
    State(state): State<SharedState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let format = ExportFormat::from_query(query.format.as_deref());
    let export = state.ingestor.export_devices(format).await?;

    tracing::debug!(
        format = %export.format,
        devices = export.device_count,
        "Serving device export"
    );

    let headers = [
        (header::CONTENT_TYPE, export.content_type().to_string()),
        (header::CONTENT_DISPOSITION, export.content_disposition()),
    ];
    Ok((headers, export.body).into_response())
}
