//! Scan session driving a [`Discoverer`].
//!
//! A session is either idle or active. While active the UI polls devices
//! every couple of seconds; each `start` runs exactly one platform discovery
//! (the platform shows one chooser per call) and a found device keeps the
//! session active. A platform failure ends the session with a single `ERROR`
//! log entry and is never retried.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::bluetooth::Discoverer;
use crate::config::ScanConfig;
use crate::error::{BluehackError, Result};
use crate::ingest::Ingestor;
use crate::types::{Device, LogLevel};

const INIT_MESSAGE: &str = "BlueHack Terminal initialized";
const READY_MESSAGE: &str = "Bluetooth discovery ready";
const UNSUPPORTED_MESSAGE: &str = "Bluetooth discovery not supported on this host";
const STARTING_MESSAGE: &str = "Starting BLE device discovery...";
const STOPPED_MESSAGE: &str = "Device discovery stopped";

/// How often the UI should refresh each collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Device list refresh while a session is active.
    pub devices: Duration,
    /// Log refresh, always.
    pub logs: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            devices: Duration::from_millis(2000),
            logs: Duration::from_millis(1000),
        }
    }
}

impl From<&ScanConfig> for PollIntervals {
    fn from(config: &ScanConfig) -> Self {
        Self {
            devices: Duration::from_millis(config.device_poll_interval_ms),
            logs: Duration::from_millis(config.log_poll_interval_ms),
        }
    }
}

/// Snapshot of the scan session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "supported": true,
    "scanning": true,
    "inProgress": false,
    "devicePollIntervalMs": 2000,
    "logPollIntervalMs": 1000
}))]
pub struct ScanStatus {
    /// Whether the host can discover devices.
    pub supported: bool,

    /// Whether a session is active.
    pub scanning: bool,

    /// Whether a platform discovery call is pending right now.
    pub in_progress: bool,

    /// Device poll interval while scanning; `null` when idle.
    #[schema(example = 2000)]
    pub device_poll_interval_ms: Option<u64>,

    /// Log poll interval.
    #[schema(example = 1000)]
    pub log_poll_interval_ms: u64,
}

#[derive(Debug, Default)]
struct SessionState {
    active: bool,
    in_flight: bool,
}

/// Discovery session bound to one registry.
pub struct Scanner {
    discoverer: Arc<dyn Discoverer>,
    ingestor: Ingestor,
    intervals: PollIntervals,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("supported", &self.discoverer.is_supported())
            .field("intervals", &self.intervals)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Scanner {
    /// Create an idle session.
    pub fn new(
        discoverer: Arc<dyn Discoverer>,
        ingestor: Ingestor,
        intervals: PollIntervals,
    ) -> Self {
        Self {
            discoverer,
            ingestor,
            intervals,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the host can discover devices.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.discoverer.is_supported()
    }

    /// Record the start-up log entries.
    pub async fn announce(&self) {
        self.ingestor.record(LogLevel::Init, INIT_MESSAGE).await;
        if self.is_supported() {
            self.ingestor.record(LogLevel::Info, READY_MESSAGE).await;
        } else {
            self.ingestor.record(LogLevel::Error, UNSUPPORTED_MESSAGE).await;
        }
    }

    /// Run one discovery and record what it finds.
    ///
    /// Returns `Ok(None)` when the session was stopped while the platform
    /// call was pending; the result is then discarded.
    ///
    /// # Errors
    ///
    /// - [`BluehackError::PlatformUnsupported`] if the host has no Bluetooth
    /// - [`BluehackError::ScanInProgress`] if a discovery is already pending
    /// - any platform error from the discovery itself; the session is then
    ///   idle again
    pub async fn start(&self) -> Result<Option<Device>> {
        if !self.is_supported() {
            self.ingestor.record(LogLevel::Error, UNSUPPORTED_MESSAGE).await;
            return Err(BluehackError::PlatformUnsupported);
        }

        {
            let mut state = self.state();
            if state.in_flight {
                return Err(BluehackError::ScanInProgress);
            }
            state.active = true;
            state.in_flight = true;
        }

        self.ingestor.record(LogLevel::Scan, STARTING_MESSAGE).await;
        info!("Starting device discovery");

        let result = self.discoverer.discover().await;

        {
            let mut state = self.state();
            state.in_flight = false;
            if result.is_err() {
                state.active = false;
            }
        }

        match result {
            Ok(handle) => {
                // Checked under the registry lock so a concurrent stop is
                // ordered either wholly before or wholly after the write.
                let device = self
                    .ingestor
                    .ingest_discovery_if(&handle, || self.state().active)
                    .await;
                if device.is_none() {
                    debug!(id = %handle.id, "Discovery finished after stop, discarding");
                }
                Ok(device)
            }
            Err(err) => {
                warn!(error = %err, "Device discovery failed");
                self.ingestor
                    .record(LogLevel::Error, format!("Scan failed: {err}"))
                    .await;
                Err(err.into())
            }
        }
    }

    /// End the session. Returns `false` if it was already idle.
    pub async fn stop(&self) -> bool {
        let was_active = std::mem::take(&mut self.state().active);
        if was_active {
            self.ingestor.record(LogLevel::Scan, STOPPED_MESSAGE).await;
            info!("Device discovery stopped");
        }
        was_active
    }

    /// Current session snapshot with recommended poll intervals.
    #[must_use]
    pub fn status(&self) -> ScanStatus {
        let state = self.state();
        ScanStatus {
            supported: self.is_supported(),
            scanning: state.active,
            in_progress: state.in_flight,
            device_poll_interval_ms: state
                .active
                .then(|| duration_ms(self.intervals.devices)),
            log_poll_interval_ms: duration_ms(self.intervals.logs),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::{MockDiscoverer, PlatformError};
    use crate::registry::Registry;
    use crate::types::ScanLog;

    fn scanner(discoverer: MockDiscoverer) -> (Scanner, Ingestor) {
        let ingestor = Ingestor::new(Registry::shared());
        let scanner = Scanner::new(
            Arc::new(discoverer),
            ingestor.clone(),
            PollIntervals::default(),
        );
        (scanner, ingestor)
    }

    fn messages(logs: &[ScanLog]) -> Vec<(LogLevel, String)> {
        // oldest first
        let mut logs = logs.to_vec();
        logs.sort_by_key(|l| l.id);
        logs.into_iter().map(|l| (l.level, l.message)).collect()
    }

    #[tokio::test]
    async fn test_announce_supported() {
        let (scanner, ingestor) = scanner(MockDiscoverer::new());
        scanner.announce().await;
        assert_eq!(
            messages(&ingestor.logs().await),
            [
                (LogLevel::Init, INIT_MESSAGE.to_string()),
                (LogLevel::Info, READY_MESSAGE.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_announce_unsupported() {
        let (scanner, ingestor) = scanner(MockDiscoverer::unsupported());
        scanner.announce().await;
        let logs = messages(&ingestor.logs().await);
        assert_eq!(logs[1], (LogLevel::Error, UNSUPPORTED_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_successful_discovery_keeps_session_active() {
        let (scanner, ingestor) = scanner(MockDiscoverer::new().with_device("AA:BB", Some("Tag1")));

        let device = scanner.start().await.unwrap().unwrap();
        assert_eq!(device.name, "Tag1");
        assert_eq!(device.id, 1);

        let status = scanner.status();
        assert!(status.scanning);
        assert!(!status.in_progress);
        assert_eq!(status.device_poll_interval_ms, Some(2000));

        assert_eq!(
            messages(&ingestor.logs().await),
            [
                (LogLevel::Scan, STARTING_MESSAGE.to_string()),
                (LogLevel::Found, "Device discovered: Tag1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_discovery_resets_to_idle_with_one_error() {
        let (scanner, ingestor) = scanner(MockDiscoverer::new().with_error(PlatformError::Denied {
            reason: "secure transport required".into(),
        }));

        let err = scanner.start().await.unwrap_err();
        assert!(matches!(err, BluehackError::PlatformDenied(_)));
        assert!(!scanner.status().scanning);

        let logs = ingestor.logs().await;
        let errors: Vec<_> = logs.iter().filter(|l| l.level == LogLevel::Error).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Scan failed: Bluetooth access denied - secure transport required"
        );
        assert_eq!(ingestor.devices().await.len(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_discovery() {
        let (scanner, ingestor) = scanner(MockDiscoverer::new());
        let err = scanner.start().await.unwrap_err();
        assert!(matches!(err, BluehackError::PlatformCancelled));
        assert!(!scanner.status().scanning);
        assert!(ingestor
            .logs()
            .await
            .iter()
            .any(|l| l.message == "Scan failed: No Bluetooth device selected"));
    }

    #[tokio::test]
    async fn test_unsupported_host_never_starts() {
        let (scanner, ingestor) = scanner(MockDiscoverer::unsupported());
        let err = scanner.start().await.unwrap_err();
        assert!(matches!(err, BluehackError::PlatformUnsupported));
        assert!(!scanner.status().scanning);

        let logs = messages(&ingestor.logs().await);
        assert_eq!(logs, [(LogLevel::Error, UNSUPPORTED_MESSAGE.to_string())]);
    }

    #[tokio::test]
    async fn test_stop_logs_once() {
        let (scanner, ingestor) = scanner(MockDiscoverer::new().with_device("AA:BB", None));
        assert!(!scanner.stop().await);

        scanner.start().await.unwrap();
        assert!(scanner.stop().await);
        assert!(!scanner.stop().await);

        let stops = ingestor
            .logs()
            .await
            .into_iter()
            .filter(|l| l.message == STOPPED_MESSAGE)
            .count();
        assert_eq!(stops, 1);
        assert_eq!(scanner.status().device_poll_interval_ms, None);
    }

    #[tokio::test]
    async fn test_stop_during_discovery_discards_result() {
        let discoverer = MockDiscoverer::new()
            .with_device("AA:BB", Some("Tag1"))
            .with_delay(Duration::from_millis(50));
        let (scanner, ingestor) = scanner(discoverer);
        let scanner = Arc::new(scanner);

        let pending = {
            let scanner = Arc::clone(&scanner);
            tokio::spawn(async move { scanner.start().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(scanner.status().in_progress);
        assert!(matches!(
            scanner.start().await,
            Err(BluehackError::ScanInProgress)
        ));
        scanner.stop().await;

        assert_eq!(pending.await.unwrap().unwrap(), None);
        assert!(ingestor.devices().await.is_empty());
    }

    #[tokio::test]
    async fn test_stop_while_ingest_waits_on_registry_discards_result() {
        let discoverer = MockDiscoverer::new()
            .with_device("AA:BB", Some("Tag1"))
            .with_delay(Duration::from_millis(30));
        let (scanner, ingestor) = scanner(discoverer);
        let scanner = Arc::new(scanner);

        let pending = {
            let scanner = Arc::clone(&scanner);
            tokio::spawn(async move { scanner.start().await })
        };
        while !ingestor
            .logs()
            .await
            .iter()
            .any(|l| l.message == STARTING_MESSAGE)
        {
            tokio::task::yield_now().await;
        }

        // Discovery returns while the registry is locked, so the ingest
        // step is parked behind this guard.
        let guard = ingestor.registry().write().await;
        while scanner.status().in_progress {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let stopping = {
            let scanner = Arc::clone(&scanner);
            tokio::spawn(async move { scanner.stop().await })
        };
        while scanner.status().scanning {
            tokio::task::yield_now().await;
        }
        drop(guard);

        assert_eq!(pending.await.unwrap().unwrap(), None);
        assert!(stopping.await.unwrap());
        assert!(ingestor.devices().await.is_empty());
        assert!(!ingestor
            .logs()
            .await
            .iter()
            .any(|l| l.level == LogLevel::Found));
    }

    #[tokio::test]
    async fn test_active_session_accepts_another_start() {
        let (scanner, ingestor) = scanner(
            MockDiscoverer::new()
                .with_device("AA:BB", Some("Tag1"))
                .with_device("CC:DD", Some("Tag2")),
        );

        scanner.start().await.unwrap();
        assert!(scanner.status().scanning);
        let second = scanner.start().await.unwrap().unwrap();
        assert_eq!(second.name, "Tag2");
        assert_eq!(ingestor.devices().await.len(), 2);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let (scanner, _) = scanner(MockDiscoverer::new());
        let json = serde_json::to_value(scanner.status()).unwrap();
        assert_eq!(json["inProgress"], false);
        assert_eq!(json["logPollIntervalMs"], 1000);
        assert!(json["devicePollIntervalMs"].is_null());
        assert!(json.get("in_progress").is_none());
    }

    #[test]
    fn test_poll_intervals_from_config() {
        let config = ScanConfig {
            device_poll_interval_ms: 500,
            log_poll_interval_ms: 250,
            ..ScanConfig::default()
        };
        let intervals = PollIntervals::from(&config);
        assert_eq!(intervals.devices, Duration::from_millis(500));
        assert_eq!(intervals.logs, Duration::from_millis(250));
    }
}
