//! Application configuration.
//!
//! Sources are layered with the `config` crate, later ones winning:
//!
//! 1. built-in defaults
//! 2. a TOML file (`BLUEHACK_CONFIG`, else `<config dir>/bluehack/config.toml`)
//! 3. environment variables, e.g. `BLUEHACK_SERVER__PORT=8080`

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BluehackError, Result};

/// Environment variable holding an explicit config file path.
pub const CONFIG_PATH_ENV: &str = "BLUEHACK_CONFIG";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "BLUEHACK";

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Discovery and polling.
    pub scan: ScanConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Allow any origin (the scanner UI is usually served elsewhere).
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_permissive: true,
        }
    }
}

/// Discovery and polling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// How long a host-side discovery waits for a device.
    pub timeout_secs: u64,
    /// Device list refresh while scanning.
    pub device_poll_interval_ms: u64,
    /// Log refresh.
    pub log_poll_interval_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            device_poll_interval_ms: 2000,
            log_poll_interval_ms: 1000,
        }
    }
}

impl ScanConfig {
    /// Discovery timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// JSON file logs plus compact stdout instead of pretty stdout.
    pub production: bool,
    /// Directory for rolling log files in production mode.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            production: false,
            directory: None,
        }
    }
}

impl Config {
    /// Load from the default locations.
    ///
    /// Uses `BLUEHACK_CONFIG` when set (the file must exist), otherwise the
    /// platform config file if present, then applies the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result fails
    /// [`Config::validate`].
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => {
                let path = Self::default_path().filter(|p| p.exists());
                Self::from_sources(path.as_deref(), Self::environment())
            }
        }
    }

    /// Load from an explicit file, then apply the environment.
    ///
    /// # Errors
    ///
    /// Returns [`BluehackError::ConfigNotFound`] if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BluehackError::ConfigNotFound(path.to_path_buf()));
        }
        Self::from_sources(Some(path), Self::environment())
    }

    /// Platform config file location, e.g. `~/.config/bluehack/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "bluehack")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_sources(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let config: Self = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`BluehackError::ConfigValidationError`] listing every
    /// invalid field.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.server.host.parse::<IpAddr>().is_err() {
            problems.push(format!(
                "server.host: '{}' is not an IP address",
                self.server.host
            ));
        }
        if self.server.port == 0 {
            problems.push("server.port: must be non-zero".to_string());
        }
        if self.scan.timeout_secs == 0 {
            problems.push("scan.timeout_secs: must be positive".to_string());
        }
        if self.scan.device_poll_interval_ms == 0 {
            problems.push("scan.device_poll_interval_ms: must be positive".to_string());
        }
        if self.scan.log_poll_interval_ms == 0 {
            problems.push("scan.log_poll_interval_ms: must be positive".to_string());
        }
        if self.logging.level.trim().is_empty() {
            problems.push("logging.level: must not be empty".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(BluehackError::ConfigValidationError(problems.join("; ")))
        }
    }

    /// Address to bind the HTTP listener to.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the host is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.server.host.parse().map_err(|_| {
            BluehackError::ConfigValidationError(format!(
                "server.host: '{}' is not an IP address",
                self.server.host
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}
