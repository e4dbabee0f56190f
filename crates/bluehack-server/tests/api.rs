//! End-to-end tests of the HTTP surface against an in-memory registry.

use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum_test::TestServer;
use bluehack_core::{
    Config, Device, DeviceStatus, Discoverer, LogLevel, MockDiscoverer, PlatformError, ScanLog,
    ScanStatus, CSV_HEADER,
};
use bluehack_server::api::{create_router, ErrorResponse};
use bluehack_server::state::AppState;
use serde_json::{json, Value};

fn server_with(discoverer: impl Discoverer + 'static) -> TestServer {
    let state = AppState::new(Config::default(), Arc::new(discoverer));
    TestServer::new(create_router(state)).unwrap()
}

fn server() -> TestServer {
    server_with(MockDiscoverer::new())
}

fn tag(rssi: Option<i32>, status: &str, last_seen: &str) -> Value {
    json!({
        "name": "Tag1",
        "address": "AA:BB",
        "rssi": rssi,
        "services": [],
        "lastSeen": last_seen,
        "status": status
    })
}

#[tokio::test]
async fn test_health() {
    let server = server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["devices"], 0);
    assert_eq!(body["scanning"], false);
}

#[tokio::test]
async fn test_upsert_keeps_id_and_updates_fields() {
    let server = server();

    let first: Device = server
        .post("/api/devices")
        .json(&tag(None, "discovered", "2024-01-01T00:00:00Z"))
        .await
        .json();
    assert_eq!(first.id, 1);
    assert_eq!(first.rssi, None);

    let second: Device = server
        .post("/api/devices")
        .json(&tag(Some(-60), "connected", "2024-01-01T00:00:05Z"))
        .await
        .json();
    assert_eq!(second.id, 1);
    assert_eq!(second.status, DeviceStatus::Connected);
    assert_eq!(second.rssi, Some(-60));

    let devices: Vec<Device> = server.get("/api/devices").await.json();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0], second);
}

#[tokio::test]
async fn test_devices_listed_newest_first() {
    let server = server();
    for (address, seen) in [
        ("AA:01", "2024-01-01T00:00:01Z"),
        ("AA:03", "2024-01-01T00:00:03Z"),
        ("AA:02", "2024-01-01T00:00:02Z"),
    ] {
        server
            .post("/api/devices")
            .json(&json!({
                "name": "Beacon",
                "address": address,
                "lastSeen": seen,
                "status": "discovered"
            }))
            .await
            .assert_status_ok();
    }

    let devices: Vec<Device> = server.get("/api/devices").await.json();
    let addresses: Vec<&str> = devices.iter().map(|d| d.address.as_str()).collect();
    assert_eq!(addresses, ["AA:03", "AA:02", "AA:01"]);
    assert!(devices.iter().all(|d| d.rssi.is_none() && d.services.is_empty()));
}

#[tokio::test]
async fn test_invalid_device_payload_is_rejected() {
    let server = server();

    let response = server
        .post("/api/devices")
        .json(&json!({ "name": "Tag1", "lastSeen": "2024-01-01T00:00:00Z", "status": "discovered" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert_eq!(error.error, "validation_error");
    assert!(error.message.starts_with("Invalid device data"));

    let response = server
        .post("/api/devices")
        .json(&tag(Some(-60), "lost", "2024-01-01T00:00:00Z"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/devices")
        .bytes("{not json".into())
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let devices: Vec<Device> = server.get("/api/devices").await.json();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_any_address_and_full_range_rssi_are_accepted() {
    let server = server();
    for (address, rssi) in [("AA BB", 40000), ("", -70), ("dev#1", -100_000)] {
        let response = server
            .post("/api/devices")
            .json(&json!({
                "name": "Tag1",
                "address": address,
                "rssi": rssi,
                "services": [],
                "lastSeen": "2024-01-01T00:00:00Z",
                "status": "discovered"
            }))
            .await;
        response.assert_status_ok();
        let device: Device = response.json();
        assert_eq!(device.address, address);
        assert_eq!(device.rssi, Some(rssi));
    }

    let devices: Vec<Device> = server.get("/api/devices").await.json();
    assert_eq!(devices.len(), 3);
}

#[tokio::test]
async fn test_logs_append_list_and_clear() {
    let server = server();

    for (i, level) in ["INFO", "SCAN", "FOUND"].iter().enumerate() {
        server
            .post("/api/logs")
            .json(&json!({
                "timestamp": format!("2024-01-01T00:00:0{i}Z"),
                "level": level,
                "message": format!("entry {i}")
            }))
            .await
            .assert_status_ok();
    }

    let logs: Vec<ScanLog> = server.get("/api/logs").await.json();
    let levels: Vec<LogLevel> = logs.iter().map(|l| l.level).collect();
    assert_eq!(levels, [LogLevel::Found, LogLevel::Scan, LogLevel::Info]);

    let cleared: Value = server.delete("/api/logs").await.json();
    assert_eq!(cleared["message"], "Logs cleared");
    assert_eq!(cleared["removed"], 3);

    let logs: Vec<ScanLog> = server.get("/api/logs").await.json();
    assert!(logs.is_empty());

    // Clearing again is still a success.
    let response = server.delete("/api/logs").await;
    response.assert_status_ok();
    let cleared: Value = response.json();
    assert_eq!(cleared["removed"], 0);
}

#[tokio::test]
async fn test_invalid_log_level_is_rejected() {
    let server = server();
    let response = server
        .post("/api/logs")
        .json(&json!({
            "timestamp": "2024-01-01T00:00:00Z",
            "level": "DEBUG",
            "message": "nope"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert!(error.message.starts_with("Invalid log data"));
}

#[tokio::test]
async fn test_csv_export() {
    let server = server();
    server
        .post("/api/devices")
        .json(&json!({
            "name": "Tag1",
            "address": "AA:BB",
            "rssi": -60,
            "services": ["180f", "180a"],
            "lastSeen": "2024-01-01T00:00:00Z",
            "status": "connected"
        }))
        .await
        .assert_status_ok();

    let response = server
        .get("/api/export/devices")
        .add_query_param("format", "csv")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "text/csv");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=bluetooth_devices.csv"
    );

    let body = response.text();
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    assert_eq!(
        lines.next(),
        Some(r#""Tag1","AA:BB",-60,"180f;180a","2024-01-01T00:00:00.000Z","connected""#)
    );
    assert_eq!(lines.next(), None);

    // Exporting is a read; the scan log is left alone.
    let logs: Vec<ScanLog> = server.get("/api/logs").await.json();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn test_json_export_is_default() {
    let server = server();
    server
        .post("/api/devices")
        .json(&tag(None, "discovered", "2024-01-01T00:00:00Z"))
        .await
        .assert_status_ok();

    for query in [None, Some("xml")] {
        let mut request = server.get("/api/export/devices");
        if let Some(format) = query {
            request = request.add_query_param("format", format);
        }
        let response = request.await;
        response.assert_status_ok();
        assert_eq!(response.header(header::CONTENT_TYPE), "application/json");
        assert_eq!(
            response.header(header::CONTENT_DISPOSITION),
            "attachment; filename=bluetooth_devices.json"
        );
        let devices: Vec<Device> = response.json();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].address, "AA:BB");
    }
}

#[tokio::test]
async fn test_empty_csv_export_is_header_only() {
    let server = server();
    let response = server
        .get("/api/export/devices")
        .add_query_param("format", "csv")
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), CSV_HEADER);
}

#[tokio::test]
async fn test_scan_records_device_and_log() {
    let server = server_with(MockDiscoverer::new().with_device("C0:FF:EE:00:00:01", Some("Tag2")));

    let response = server.post("/api/scan").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let device: Device = serde_json::from_value(body["device"].clone()).unwrap();
    assert_eq!(device.name, "Tag2");
    assert_eq!(device.address, "C0:FF:EE:00:00:01");
    assert_eq!(device.status, DeviceStatus::Discovered);
    assert_eq!(body["status"]["scanning"], true);
    assert_eq!(body["status"]["devicePollIntervalMs"], 2000);

    let logs: Vec<ScanLog> = server.get("/api/logs").await.json();
    assert_eq!(logs[0].level, LogLevel::Found);
    assert_eq!(logs[0].message, "Device discovered: Tag2");

    let stop: Value = server.delete("/api/scan").await.json();
    assert_eq!(stop["stopped"], true);
    let status: ScanStatus = server.get("/api/scan").await.json();
    assert!(!status.scanning);
    assert_eq!(status.device_poll_interval_ms, None);
}

#[tokio::test]
async fn test_scan_failures_map_to_status_codes() {
    let server = server_with(
        MockDiscoverer::new()
            .with_error(PlatformError::Denied {
                reason: "user refused".into(),
            })
            .with_error(PlatformError::Cancelled),
    );

    server
        .post("/api/scan")
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .post("/api/scan")
        .await
        .assert_status(StatusCode::CONFLICT);

    let logs: Vec<ScanLog> = server.get("/api/logs").await.json();
    let errors = logs.iter().filter(|l| l.level == LogLevel::Error).count();
    assert_eq!(errors, 2);

    let devices: Vec<Device> = server.get("/api/devices").await.json();
    assert!(devices.is_empty());
    let status: ScanStatus = server.get("/api/scan").await.json();
    assert!(!status.scanning);
}

#[tokio::test]
async fn test_scan_unsupported_host() {
    let server = server_with(MockDiscoverer::unsupported());
    let response = server.post("/api/scan").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let status: ScanStatus = server.get("/api/scan").await.json();
    assert!(!status.supported);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let server = server();
    let response = server.get("/api/openapi.json").await;
    response.assert_status_ok();
    let doc: Value = response.json();
    assert!(doc["paths"]["/api/scan"].is_object());
}
