//! Device and scan log records.
//!
//! These are the two entity collections held by the
//! [`Registry`](crate::registry::Registry). Field names are camelCase on the
//! wire (`lastSeen`) so that the records match what the scanner UI sends and
//! expects back.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Connection status of a discovered device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Seen by a discovery but never connected.
    Discovered,
    /// A GATT connection was established.
    Connected,
    /// A connection attempt failed.
    Failed,
}

impl DeviceStatus {
    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Bluetooth device known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "name": "Tag1",
    "address": "AA:BB:CC:DD:EE:FF",
    "rssi": -60,
    "services": ["battery_service"],
    "lastSeen": "2025-01-15T03:30:00Z",
    "status": "discovered"
}))]
pub struct Device {
    /// Surrogate id assigned on first sighting.
    #[schema(example = 1)]
    pub id: u64,

    /// Advertised name.
    #[schema(example = "Tag1")]
    pub name: String,

    /// Address or platform device id. Unique within the registry.
    #[schema(example = "AA:BB:CC:DD:EE:FF")]
    pub address: String,

    /// Signal strength in dBm, when known.
    #[schema(example = -60)]
    pub rssi: Option<i32>,

    /// Advertised service identifiers, in the order reported.
    pub services: Vec<String>,

    /// When the device was last observed.
    pub last_seen: DateTime<Utc>,

    /// Connection status.
    pub status: DeviceStatus,
}

impl Device {
    pub(crate) fn create(id: u64, new: NewDevice) -> Self {
        Self {
            id,
            name: new.name,
            address: new.address,
            rssi: new.rssi.flatten(),
            services: new.services.flatten().unwrap_or_default(),
            last_seen: new.last_seen,
            status: new.status,
        }
    }

    /// Overwrite fields with those of a new observation.
    ///
    /// `rssi` and `services` are only touched when the observation carried
    /// them; an explicit `null` clears them.
    pub(crate) fn merge(&mut self, new: NewDevice) {
        self.name = new.name;
        self.last_seen = new.last_seen;
        self.status = new.status;
        if let Some(rssi) = new.rssi {
            self.rssi = rssi;
        }
        if let Some(services) = new.services {
            self.services = services.unwrap_or_default();
        }
    }
}

/// A validated device observation, as submitted by the UI or produced by a
/// discovery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "name": "Tag1",
    "address": "AA:BB:CC:DD:EE:FF",
    "rssi": null,
    "services": [],
    "lastSeen": "2025-01-15T03:30:00Z",
    "status": "discovered"
}))]
pub struct NewDevice {
    /// Advertised name.
    pub name: String,

    /// Address or platform device id.
    pub address: String,

    /// Outer `None`: field absent. `Some(None)`: explicit `null`.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i32>)]
    pub rssi: Option<Option<i32>>,

    /// Outer `None`: field absent. `Some(None)`: explicit `null`.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<Vec<String>>)]
    pub services: Option<Option<Vec<String>>>,

    /// When the device was observed.
    pub last_seen: DateTime<Utc>,

    /// Connection status.
    pub status: DeviceStatus,
}

impl NewDevice {
    /// An observation with no signal strength and no services reported.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        last_seen: DateTime<Utc>,
        status: DeviceStatus,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            rssi: None,
            services: None,
            last_seen,
            status,
        }
    }

    /// Set (or explicitly clear) the signal strength.
    #[must_use]
    pub const fn with_rssi(mut self, rssi: Option<i32>) -> Self {
        self.rssi = Some(rssi);
        self
    }

    /// Set the advertised services.
    #[must_use]
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = Some(Some(services.into_iter().map(Into::into).collect()));
        self
    }
}

/// Severity/category of a scan log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// General information.
    Info,
    /// A failure surfaced to the user.
    Error,
    /// Scan started or stopped.
    Scan,
    /// A device was discovered.
    Found,
    /// Start-up.
    Init,
}

impl LogLevel {
    /// Wire representation of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
            Self::Scan => "SCAN",
            Self::Found => "FOUND",
            Self::Init => "INIT",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored scan log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "timestamp": "2025-01-15T03:30:00Z",
    "level": "FOUND",
    "message": "Device discovered: Tag1"
}))]
pub struct ScanLog {
    /// Monotonic surrogate id.
    pub id: u64,

    /// When the event happened.
    pub timestamp: DateTime<Utc>,

    /// Event category.
    pub level: LogLevel,

    /// Free text.
    pub message: String,
}

/// A log entry before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[schema(example = json!({
    "timestamp": "2025-01-15T03:30:00Z",
    "level": "SCAN",
    "message": "Starting BLE device discovery..."
}))]
pub struct NewScanLog {
    /// When the event happened.
    pub timestamp: DateTime<Utc>,

    /// Event category.
    pub level: LogLevel,

    /// Free text.
    pub message: String,
}

impl NewScanLog {
    /// An entry stamped with the current time.
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
