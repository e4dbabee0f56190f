//! # bluehack-core
//!
//! Core logic for the bluehack Bluetooth Low Energy discovery recorder.
//!
//! This crate provides:
//! - An in-memory registry of discovered devices and scan log entries
//! - JSON and CSV export of the device collection
//! - A validating ingestion façade in front of the registry
//! - A discovery capability abstraction and the scan session built on it
//! - Configuration loading and validation
//!
//! ## Architecture
//!
//! - [`types`] - Device and scan log records
//! - [`registry`] - The device/log store and its CRUD contract
//! - [`export`] - JSON and CSV rendering of the device collection
//! - [`ingest`] - Payload validation and event translation
//! - [`bluetooth`] - The [`Discoverer`] capability and its implementations
//! - [`scanner`] - Scan session state on top of a discoverer
//! - [`config`] - Layered configuration
//! - [`error`] - Unified error types for the crate

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod bluetooth;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod registry;
pub mod scanner;
pub mod types;

// Re-export primary types for convenience
#[cfg(feature = "bluetooth")]
pub use bluetooth::BluezDiscoverer;
#[cfg(any(test, feature = "mock-bluetooth"))]
pub use bluetooth::MockDiscoverer;
pub use bluetooth::{
    DeviceHandle, Discoverer, PlatformError, PlatformResult, UnsupportedDiscoverer,
    UNKNOWN_DEVICE_NAME,
};
pub use config::{Config, LoggingConfig, ScanConfig, ServerConfig};
pub use error::{BluehackError, Result};
pub use export::{DeviceExport, ExportFormat, CSV_HEADER, MISSING_RSSI};
pub use ingest::{parse_device, parse_log, Ingestor};
pub use registry::{Registry, SharedRegistry, Upsert};
pub use scanner::{PollIntervals, ScanStatus, Scanner};
pub use types::{Device, DeviceStatus, LogLevel, NewDevice, NewScanLog, ScanLog};
