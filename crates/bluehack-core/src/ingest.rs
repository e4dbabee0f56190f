//! Ingestion façade in front of the registry.
//!
//! Inbound device and log payloads arrive as untyped JSON. They are checked
//! here (required fields, primitive types, known enum values) before
//! anything touches the [`Registry`](crate::registry::Registry);
//! a rejected payload never mutates state. Discovery results and UI events
//! are translated into registry writes through the same path.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::bluetooth::DeviceHandle;
use crate::error::{BluehackError, Result};
use crate::export::{DeviceExport, ExportFormat};
use crate::registry::{Registry, SharedRegistry, Upsert};
use crate::types::{Device, DeviceStatus, LogLevel, NewDevice, NewScanLog, ScanLog};

/// Validate a device payload.
///
/// # Errors
///
/// Returns [`BluehackError::Validation`] if a required field is missing or
/// has the wrong type. Any string is accepted as an address.
pub fn parse_device(payload: Value) -> Result<NewDevice> {
    if !payload.is_object() {
        return Err(BluehackError::validation("device", "expected a JSON object"));
    }
    serde_json::from_value(payload).map_err(|e| BluehackError::validation("device", e.to_string()))
}

/// Validate a log payload.
///
/// # Errors
///
/// Returns [`BluehackError::Validation`] if a required field is missing or
/// the level is not one of `INFO`, `ERROR`, `SCAN`, `FOUND`, `INIT`.
pub fn parse_log(payload: Value) -> Result<NewScanLog> {
    if !payload.is_object() {
        return Err(BluehackError::validation("log", "expected a JSON object"));
    }
    serde_json::from_value(payload).map_err(|e| BluehackError::validation("log", e.to_string()))
}

/// Validating front door to the shared registry.
#[derive(Debug, Clone)]
pub struct Ingestor {
    registry: SharedRegistry,
}

impl Ingestor {
    /// Wrap a registry handle.
    #[must_use]
    pub const fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// The underlying registry handle.
    #[must_use]
    pub const fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Validate and upsert a device payload.
    ///
    /// # Errors
    ///
    /// Returns a validation error without touching the registry if the
    /// payload is malformed.
    pub async fn submit_device(&self, payload: Value) -> Result<Upsert> {
        let device = parse_device(payload)?;
        let outcome = self.registry.write().await.upsert_device(device);
        info!(
            id = outcome.device().id,
            address = %outcome.device().address,
            created = outcome.is_created(),
            "Device recorded"
        );
        Ok(outcome)
    }

    /// Validate and append a log payload.
    ///
    /// # Errors
    ///
    /// Returns a validation error without touching the registry if the
    /// payload is malformed.
    pub async fn submit_log(&self, payload: Value) -> Result<ScanLog> {
        let entry = parse_log(payload)?;
        let log = self.registry.write().await.append_log(entry);
        debug!(id = log.id, level = %log.level, "Log recorded");
        Ok(log)
    }

    /// Append a log entry stamped now.
    pub async fn record(&self, level: LogLevel, message: impl Into<String>) -> ScanLog {
        let entry = NewScanLog::now(level, message);
        self.registry.write().await.append_log(entry)
    }

    /// Record a discovered device and a matching `FOUND` log entry.
    ///
    /// The platform gives no signal strength or services without a
    /// connection, so those are recorded as empty.
    pub async fn ingest_discovery(&self, handle: &DeviceHandle) -> Device {
        let mut registry = self.registry.write().await;
        record_discovery(&mut registry, handle)
    }

    /// Like [`Ingestor::ingest_discovery`], but only if `keep` still holds
    /// once the registry is locked.
    pub async fn ingest_discovery_if<F>(&self, handle: &DeviceHandle, keep: F) -> Option<Device>
    where
        F: FnOnce() -> bool,
    {
        let mut registry = self.registry.write().await;
        keep().then(|| record_discovery(&mut registry, handle))
    }

    /// All devices, most recently seen first.
    pub async fn devices(&self) -> Vec<Device> {
        self.registry.read().await.list_devices()
    }

    /// All log entries, newest first.
    pub async fn logs(&self) -> Vec<ScanLog> {
        self.registry.read().await.list_logs()
    }

    /// Empty the log collection.
    pub async fn clear_logs(&self) -> usize {
        let removed = self.registry.write().await.clear_logs();
        info!(removed, "Scan logs cleared");
        removed
    }

    /// Render a snapshot of the device collection. Read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub async fn export_devices(&self, format: ExportFormat) -> Result<DeviceExport> {
        let export = self.registry.read().await.export_devices(format)?;
        info!(%format, devices = export.device_count, "Devices exported");
        Ok(export)
    }
}

fn record_discovery(registry: &mut Registry, handle: &DeviceHandle) -> Device {
    let name = handle.display_name().to_string();
    let now = Utc::now();
    let observation = NewDevice::new(name.clone(), handle.id.clone(), now, DeviceStatus::Discovered)
        .with_rssi(None)
        .with_services(Vec::<String>::new());

    let device = registry.upsert_device(observation).into_device();
    registry.append_log(NewScanLog {
        timestamp: now,
        level: LogLevel::Found,
        message: format!("Device discovered: {name}"),
    });
    info!(id = device.id, address = %device.address, name = %name, "Device discovered");
    device
}
