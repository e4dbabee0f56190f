//! Bluetooth device discovery capability.
//!
//! Discovery is owned by the host platform. The rest of the crate only sees
//! the [`Discoverer`] trait: one call that resolves to at most one device, or
//! a [`PlatformError`]. Implementations:
//!
//! - [`UnsupportedDiscoverer`] - hosts without Bluetooth
//! - [`BluezDiscoverer`] - Linux/BlueZ via `bluer` (`bluetooth` feature)
//! - [`MockDiscoverer`] - scripted results (`mock-bluetooth` feature, tests)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Name recorded for devices that do not advertise one.
pub const UNKNOWN_DEVICE_NAME: &str = "UNKNOWN_DEVICE";

/// An opaque device picked by the platform.
///
/// Only the name and an address-like id are available without connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeviceHandle {
    /// Stable address or platform-assigned id.
    #[schema(example = "AA:BB:CC:DD:EE:FF")]
    pub id: String,

    /// Advertised name, if any.
    #[schema(example = "Tag1")]
    pub name: Option<String>,
}

impl DeviceHandle {
    /// Create a handle.
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }

    /// Advertised name, or [`UNKNOWN_DEVICE_NAME`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(UNKNOWN_DEVICE_NAME)
    }
}

/// Failures reported by the platform's discovery call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// No Bluetooth capability on this host.
    #[error("Bluetooth not supported on this host")]
    Unsupported,

    /// Access refused, e.g. insufficient transport security or permissions.
    #[error("Bluetooth access denied - {reason}")]
    Denied {
        /// Platform-provided reason.
        reason: String,
    },

    /// Discovery finished without a device being chosen.
    #[error("No Bluetooth device selected")]
    Cancelled,

    /// Any other platform failure.
    #[error("Failed to request Bluetooth device: {message}")]
    Failed {
        /// Platform-provided detail.
        message: String,
    },
}

/// Result type for discovery calls.
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Host capability that picks one nearby device.
#[async_trait]
pub trait Discoverer: Send + Sync {
    /// Whether this host can discover at all.
    fn is_supported(&self) -> bool;

    /// Run a single discovery. Resolves to at most one device.
    async fn discover(&self) -> PlatformResult<DeviceHandle>;
}

// =============================================================================
// Unsupported host
// =============================================================================

/// Discoverer for hosts with no Bluetooth stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedDiscoverer;

#[async_trait]
impl Discoverer for UnsupportedDiscoverer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn discover(&self) -> PlatformResult<DeviceHandle> {
        Err(PlatformError::Unsupported)
    }
}

// =============================================================================
// Scripted discoverer
// =============================================================================

#[cfg(any(test, feature = "mock-bluetooth"))]
pub use mock::MockDiscoverer;

#[cfg(any(test, feature = "mock-bluetooth"))]
mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{DeviceHandle, Discoverer, PlatformError, PlatformResult};

    /// Discoverer that replays queued results in order.
    ///
    /// An exhausted queue behaves like the user dismissing the chooser.
    #[derive(Debug, Default)]
    pub struct MockDiscoverer {
        supported: bool,
        delay: Option<Duration>,
        results: Mutex<VecDeque<PlatformResult<DeviceHandle>>>,
    }

    impl MockDiscoverer {
        /// A supported discoverer with nothing queued.
        #[must_use]
        pub fn new() -> Self {
            Self {
                supported: true,
                ..Self::default()
            }
        }

        /// A discoverer reporting no Bluetooth support.
        #[must_use]
        pub fn unsupported() -> Self {
            Self::default()
        }

        /// Queue a successful discovery.
        #[must_use]
        pub fn with_device(self, id: &str, name: Option<&str>) -> Self {
            self.push(Ok(DeviceHandle::new(id, name.map(str::to_string))));
            self
        }

        /// Queue a failed discovery.
        #[must_use]
        pub fn with_error(self, error: PlatformError) -> Self {
            self.push(Err(error));
            self
        }

        /// Sleep this long before resolving each discovery.
        #[must_use]
        pub const fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn push(&self, result: PlatformResult<DeviceHandle>) {
            if let Ok(mut results) = self.results.lock() {
                results.push_back(result);
            }
        }
    }

    #[async_trait]
    impl Discoverer for MockDiscoverer {
        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn discover(&self) -> PlatformResult<DeviceHandle> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if !self.supported {
                return Err(PlatformError::Unsupported);
            }
            self.results
                .lock()
                .ok()
                .and_then(|mut results| results.pop_front())
                .unwrap_or(Err(PlatformError::Cancelled))
        }
    }
}

// =============================================================================
// BlueZ
// =============================================================================

#[cfg(feature = "bluetooth")]
pub use bluez::BluezDiscoverer;

#[cfg(feature = "bluetooth")]
mod bluez {
    use std::time::Duration;

    use async_trait::async_trait;
    use bluer::{AdapterEvent, ErrorKind};
    use futures::{pin_mut, StreamExt};
    use tracing::{debug, info, warn};

    use super::{DeviceHandle, Discoverer, PlatformError, PlatformResult};

    /// Discoverer backed by the BlueZ daemon.
    ///
    /// Powers on the default adapter and reports the first device it
    /// announces within `timeout`.
    #[derive(Debug, Clone)]
    pub struct BluezDiscoverer {
        timeout: Duration,
    }

    impl BluezDiscoverer {
        /// Create a discoverer that gives up after `timeout`.
        #[must_use]
        pub const fn new(timeout: Duration) -> Self {
            Self { timeout }
        }

        async fn first_device(&self) -> PlatformResult<DeviceHandle> {
            let session = bluer::Session::new().await.map_err(|e| {
                warn!(error = %e, "Cannot reach bluetoothd");
                PlatformError::Unsupported
            })?;
            let adapter = session.default_adapter().await.map_err(map_error)?;
            adapter.set_powered(true).await.map_err(map_error)?;

            info!(adapter = %adapter.name(), "Discovering devices");
            let events = adapter.discover_devices().await.map_err(map_error)?;
            pin_mut!(events);

            while let Some(event) = events.next().await {
                if let AdapterEvent::DeviceAdded(addr) = event {
                    let device = adapter.device(addr).map_err(map_error)?;
                    let name = device.name().await.map_err(map_error)?;
                    debug!(%addr, ?name, "Device announced");
                    return Ok(DeviceHandle::new(addr.to_string(), name));
                }
            }
            Err(PlatformError::Cancelled)
        }
    }

    #[async_trait]
    impl Discoverer for BluezDiscoverer {
        fn is_supported(&self) -> bool {
            true
        }

        async fn discover(&self) -> PlatformResult<DeviceHandle> {
            match tokio::time::timeout(self.timeout, self.first_device()).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(timeout_secs = self.timeout.as_secs(), "Discovery timed out");
                    Err(PlatformError::Cancelled)
                }
            }
        }
    }

    fn map_error(err: bluer::Error) -> PlatformError {
        match err.kind {
            ErrorKind::NotAuthorized | ErrorKind::NotPermitted => PlatformError::Denied {
                reason: err.message,
            },
            ErrorKind::NotSupported | ErrorKind::NotAvailable | ErrorKind::NotReady => {
                PlatformError::Unsupported
            }
            _ => PlatformError::Failed {
                message: err.to_string(),
            },
        }
    }
}
