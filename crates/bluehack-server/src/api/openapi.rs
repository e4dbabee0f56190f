//! OpenAPI specification generation for the bluehack API.
//!
//! The document is served at `/api/openapi.json` and written to disk by the
//! `gen-openapi` binary for client generation.

use axum::Json;
use bluehack_core::{
    Device, DeviceStatus, ExportFormat, LogLevel, NewDevice, NewScanLog, ScanLog, ScanStatus,
};
use utoipa::OpenApi;

use super::error::ErrorResponse;
use super::health::HealthResponse;
use super::logs::ClearLogsResponse;
use super::scan::{ScanResponse, StopScanResponse};

/// Serve the OpenAPI specification as JSON.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Returns the OpenAPI specification as a pretty-printed string.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

/// Main OpenAPI document structure for bluehack.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "bluehack API",
        version = "0.1.0",
        description = r#"
# bluehack API

bluehack records Bluetooth Low Energy devices seen by a scanning terminal.

## Overview

1. **Devices**: one record per hardware address, refreshed on every sighting
2. **Scan log**: a timestamped journal of what the scanner did
3. **Export**: the device table as JSON or CSV
4. **Scan**: ask the host Bluetooth stack for a nearby device

Collections are returned newest first. All data lives in memory and is lost on restart.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local bluehack server")
    ),
    tags(
        (name = "system", description = "Health checks"),
        (name = "devices", description = "Discovered device registry"),
        (name = "logs", description = "Scan log journal"),
        (name = "export", description = "Device table downloads"),
        (name = "scan", description = "Bluetooth discovery session")
    ),
    paths(
        super::health::health_check,
        super::devices::list_devices,
        super::devices::upsert_device,
        super::logs::list_logs,
        super::logs::create_log,
        super::logs::clear_logs,
        super::export::export_devices,
        super::scan::scan_status,
        super::scan::start_scan,
        super::scan::stop_scan,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            // Registry records
            Device,
            DeviceStatus,
            NewDevice,
            ScanLog,
            LogLevel,
            NewScanLog,
            ClearLogsResponse,
            ExportFormat,
            // Scan session
            ScanStatus,
            ScanResponse,
            StopScanResponse,
        )
    )
)]
pub struct ApiDoc;
