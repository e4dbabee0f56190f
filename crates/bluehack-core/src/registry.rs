//! In-memory device and scan log registry.
//!
//! The registry is the single store behind every entry point: HTTP handlers,
//! the discovery session and exports all go through one [`Registry`] wrapped
//! in a [`SharedRegistry`] that is created once at start-up.
//!
//! Devices are keyed by address. Re-observing an address updates the stored
//! record in place and keeps its surrogate id. Logs are append-only until
//! [`Registry::clear_logs`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::export::{DeviceExport, ExportFormat};
use crate::types::{Device, NewDevice, NewScanLog, ScanLog};

/// Registry handle shared between request handlers and the scanner.
pub type SharedRegistry = Arc<RwLock<Registry>>;

/// Result of [`Registry::upsert_device`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    /// A new record was created.
    Created(Device),
    /// An existing record was updated in place.
    Updated(Device),
}

impl Upsert {
    /// The stored record.
    #[must_use]
    pub const fn device(&self) -> &Device {
        match self {
            Self::Created(device) | Self::Updated(device) => device,
        }
    }

    /// Consume the outcome, keeping the stored record.
    #[must_use]
    pub fn into_device(self) -> Device {
        match self {
            Self::Created(device) | Self::Updated(device) => device,
        }
    }

    /// Whether the record was newly created.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Device and log collections for the lifetime of the process.
#[derive(Debug)]
pub struct Registry {
    /// Insertion order; sorting for display happens on read.
    devices: Vec<Device>,
    by_address: HashMap<String, usize>,
    logs: Vec<ScanLog>,
    next_device_id: u64,
    next_log_id: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            by_address: HashMap::new(),
            logs: Vec::new(),
            next_device_id: 1,
            next_log_id: 1,
        }
    }

    /// Create an empty registry behind a shared handle.
    #[must_use]
    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    // =========================================================================
    // Devices
    // =========================================================================

    /// All devices, most recently seen first. Equal timestamps keep
    /// insertion order.
    #[must_use]
    pub fn list_devices(&self) -> Vec<Device> {
        let mut devices = self.devices.clone();
        // sort_by is stable
        devices.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        devices
    }

    /// Look up a device by address.
    #[must_use]
    pub fn device(&self, address: &str) -> Option<&Device> {
        self.by_address.get(address).map(|&idx| &self.devices[idx])
    }

    /// Insert a new device or merge into the record with the same address.
    pub fn upsert_device(&mut self, new: NewDevice) -> Upsert {
        if let Some(&idx) = self.by_address.get(&new.address) {
            let device = &mut self.devices[idx];
            device.merge(new);
            debug!(id = device.id, address = %device.address, "Updated device");
            return Upsert::Updated(device.clone());
        }

        let id = self.next_device_id;
        self.next_device_id += 1;

        let device = Device::create(id, new);
        debug!(id, address = %device.address, "Created device");
        self.by_address
            .insert(device.address.clone(), self.devices.len());
        self.devices.push(device.clone());
        Upsert::Created(device)
    }

    /// Number of known devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Render the current device list, in [`Self::list_devices`] order.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn export_devices(&self, format: ExportFormat) -> Result<DeviceExport> {
        DeviceExport::render(&self.list_devices(), format)
    }

    // =========================================================================
    // Logs
    // =========================================================================

    /// All log entries, newest first. Equal timestamps keep insertion order.
    #[must_use]
    pub fn list_logs(&self) -> Vec<ScanLog> {
        let mut logs = self.logs.clone();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        logs
    }

    /// Store a log entry under the next id.
    pub fn append_log(&mut self, entry: NewScanLog) -> ScanLog {
        let log = ScanLog {
            id: self.next_log_id,
            timestamp: entry.timestamp,
            level: entry.level,
            message: entry.message,
        };
        self.next_log_id += 1;
        self.logs.push(log.clone());
        log
    }

    /// Drop every log entry and return how many there were. Ids are not
    /// reused afterwards.
    pub fn clear_logs(&mut self) -> usize {
        let removed = self.logs.len();
        self.logs.clear();
        removed
    }

    /// Number of stored log entries.
    #[must_use]
    pub fn log_count(&self) -> usize {
        self.logs.len()
    }
}
