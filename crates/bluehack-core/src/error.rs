//! Unified error types for the bluehack core library.
//!
//! [`BluehackError`] covers every failure mode of the registry, the
//! ingestion façade, the discovery session and configuration loading. The
//! discovery layer has its own [`PlatformError`](crate::bluetooth::PlatformError)
//! which converts into the unified type.
//!
//! # Example
//!
//! ```rust
//! use bluehack_core::error::{BluehackError, Result};
//!
//! fn require_address(address: &str) -> Result<()> {
//!     if address.trim().is_empty() {
//!         return Err(BluehackError::validation("device", "missing field `address`"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_address("").is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// The unified error type for all bluehack operations.
#[derive(Debug, Error)]
pub enum BluehackError {
    // =========================================================================
    // VALIDATION ERRORS
    // =========================================================================
    /// An inbound payload did not match the record schema.
    #[error("Invalid {entity} data: {message}")]
    Validation {
        /// Which record kind was being validated ("device" or "log").
        entity: &'static str,
        /// What was wrong with it.
        message: String,
    },

    // =========================================================================
    // BLUETOOTH PLATFORM ERRORS
    // =========================================================================
    /// The host has no usable Bluetooth discovery capability.
    #[error("Bluetooth not supported on this host")]
    PlatformUnsupported,

    /// The platform refused access to Bluetooth.
    #[error("Bluetooth access denied: {0}")]
    PlatformDenied(String),

    /// Discovery ended without a device being selected.
    #[error("No Bluetooth device selected")]
    PlatformCancelled,

    /// The platform call failed for another reason.
    #[error("Failed to request Bluetooth device: {0}")]
    PlatformFailed(String),

    /// A discovery is already running.
    #[error("A device discovery is already in progress")]
    ScanInProgress,

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration file was not found at the expected path.
    #[error("Configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration sources could not be merged or deserialized.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // =========================================================================
    // INTERNAL ERRORS
    // =========================================================================
    /// Serializing a snapshot failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized [`Result`] type for bluehack operations.
pub type Result<T> = std::result::Result<T, BluehackError>;

impl BluehackError {
    /// Shorthand for a [`BluehackError::Validation`] error.
    #[must_use]
    pub fn validation(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            entity,
            message: message.into(),
        }
    }

    /// Returns `true` if this error is a rejected inbound payload.
    #[inline]
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` if this error came from the Bluetooth platform.
    #[inline]
    #[must_use]
    pub const fn is_platform_error(&self) -> bool {
        matches!(
            self,
            Self::PlatformUnsupported
                | Self::PlatformDenied(_)
                | Self::PlatformCancelled
                | Self::PlatformFailed(_)
        )
    }

    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::ConfigParseError(_) | Self::ConfigValidationError(_)
        )
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[inline]
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::Validation { .. } => 400,

            // 403 Forbidden - the platform refused
            Self::PlatformDenied(_) => 403,

            // 409 Conflict - nothing selected, or a scan is already running
            Self::PlatformCancelled | Self::ScanInProgress => 409,

            // 502 Bad Gateway - the platform call itself failed
            Self::PlatformFailed(_) => 502,

            // 503 Service Unavailable - no Bluetooth on this host
            Self::PlatformUnsupported => 503,

            // 500 Internal Server Error
            Self::ConfigNotFound(_)
            | Self::ConfigParseError(_)
            | Self::ConfigValidationError(_)
            | Self::Serialization(_) => 500,
        }
    }

    /// Returns a machine-readable error code for API responses.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::PlatformUnsupported => "PLATFORM_UNSUPPORTED",
            Self::PlatformDenied(_) => "PLATFORM_DENIED",
            Self::PlatformCancelled => "PLATFORM_CANCELLED",
            Self::PlatformFailed(_) => "PLATFORM_FAILED",
            Self::ScanInProgress => "SCAN_IN_PROGRESS",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<crate::bluetooth::PlatformError> for BluehackError {
    fn from(err: crate::bluetooth::PlatformError) -> Self {
        use crate::bluetooth::PlatformError;
        match err {
            PlatformError::Unsupported => Self::PlatformUnsupported,
            PlatformError::Denied { reason } => Self::PlatformDenied(reason),
            PlatformError::Cancelled => Self::PlatformCancelled,
            PlatformError::Failed { message } => Self::PlatformFailed(message),
        }
    }
}

impl From<::config::ConfigError> for BluehackError {
    fn from(err: ::config::ConfigError) -> Self {
        match err {
            ::config::ConfigError::NotFound(key) => {
                Self::ConfigParseError(format!("missing key: {key}"))
            }
            other => Self::ConfigParseError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::PlatformError;

    #[test]
    fn test_validation_error_classification() {
        let err = BluehackError::validation("device", "missing field `address`");
        assert!(err.is_validation_error());
        assert!(!err.is_platform_error());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(
            err.to_string(),
            "Invalid device data: missing field `address`"
        );
    }

    #[test]
    fn test_platform_error_classification() {
        assert!(BluehackError::PlatformUnsupported.is_platform_error());
        assert!(BluehackError::PlatformDenied("https".into()).is_platform_error());
        assert!(BluehackError::PlatformCancelled.is_platform_error());
        assert!(BluehackError::PlatformFailed("dbus".into()).is_platform_error());

        assert!(!BluehackError::ScanInProgress.is_platform_error());
    }

    #[test]
    fn test_config_error_classification() {
        assert!(BluehackError::ConfigNotFound(PathBuf::from("/test")).is_config_error());
        assert!(BluehackError::ConfigParseError("syntax".into()).is_config_error());
        assert!(BluehackError::ConfigValidationError("port".into()).is_config_error());

        assert!(!BluehackError::PlatformCancelled.is_config_error());
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(BluehackError::PlatformUnsupported.http_status_code(), 503);
        assert_eq!(BluehackError::PlatformDenied("x".into()).http_status_code(), 403);
        assert_eq!(BluehackError::PlatformCancelled.http_status_code(), 409);
        assert_eq!(BluehackError::ScanInProgress.http_status_code(), 409);
        assert_eq!(BluehackError::PlatformFailed("x".into()).http_status_code(), 502);
        assert_eq!(
            BluehackError::ConfigValidationError("x".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BluehackError::PlatformUnsupported.error_code(),
            "PLATFORM_UNSUPPORTED"
        );
        assert_eq!(BluehackError::ScanInProgress.error_code(), "SCAN_IN_PROGRESS");
        assert_eq!(
            BluehackError::validation("log", "bad level").error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_from_platform_error() {
        let err: BluehackError = PlatformError::Cancelled.into();
        assert!(matches!(err, BluehackError::PlatformCancelled));

        let err: BluehackError = PlatformError::Denied {
            reason: "secure transport required".into(),
        }
        .into();
        assert!(err.to_string().contains("secure transport required"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<BluehackError>();
        assert_sync::<BluehackError>();
    }
}
