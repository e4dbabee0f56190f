//! API error types and response handling.
//!
//! This module provides a unified error type for all API handlers
//! with automatic conversion to appropriate HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bluehack_core::BluehackError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type.
///
/// Each variant maps to a specific HTTP status code and produces a
/// consistent JSON error response.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// 400 Bad Request - Invalid input from client.
    BadRequest {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 403 Forbidden - The Bluetooth platform refused access.
    Forbidden {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 409 Conflict - Operation cannot be completed due to current state.
    Conflict {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 500 Internal Server Error - Unexpected server-side error.
    InternalError {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
        /// Optional details (logged, not exposed to the client).
        details: Option<String>,
    },

    /// 502 Bad Gateway - The Bluetooth platform call failed.
    BadGateway {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
        /// Optional additional details.
        details: Option<String>,
    },

    /// 503 Service Unavailable - No Bluetooth on this host.
    ServiceUnavailable {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },
}

/// Standard JSON error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "validation_error",
    "message": "Invalid device data: missing field `address`",
    "details": null
}))]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "validation_error").
    #[schema(example = "validation_error")]
    pub error: String,

    /// Human-readable error message.
    #[schema(example = "Invalid device data: missing field `address`")]
    pub message: String,

    /// Optional additional details for debugging.
    #[schema(nullable)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// A request body that was not valid JSON for the given record kind.
    pub fn invalid_body(entity: &str, rejection: &JsonRejection) -> Self {
        Self::BadRequest {
            error_code: "invalid_body".to_string(),
            message: format!("Invalid {entity} data: {}", rejection.body_text()),
        }
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_response = match self {
            Self::BadRequest { error_code, message }
            | Self::Forbidden { error_code, message }
            | Self::Conflict { error_code, message }
            | Self::ServiceUnavailable { error_code, message } => ErrorResponse {
                error: error_code,
                message,
                details: None,
            },

            Self::BadGateway {
                error_code,
                message,
                details,
            } => ErrorResponse {
                error: error_code,
                message,
                details: details.map(|d| serde_json::json!(d)),
            },

            Self::InternalError {
                error_code,
                message,
                details,
            } => {
                // Log internal errors
                tracing::error!(
                    error_code = %error_code,
                    message = %message,
                    details = ?details,
                    "Internal server error"
                );

                ErrorResponse {
                    error: error_code,
                    message: "Internal server error".to_string(),
                    details: None,
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest { message, .. } => write!(f, "Bad Request: {message}"),
            Self::Forbidden { message, .. } => write!(f, "Forbidden: {message}"),
            Self::Conflict { message, .. } => write!(f, "Conflict: {message}"),
            Self::InternalError { message, .. } => write!(f, "Internal Error: {message}"),
            Self::BadGateway { message, .. } => write!(f, "Bad Gateway: {message}"),
            Self::ServiceUnavailable { message, .. } => {
                write!(f, "Service Unavailable: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Convert from bluehack_core errors.
impl From<BluehackError> for ApiError {
    fn from(err: BluehackError) -> Self {
        let error_code = err.error_code().to_ascii_lowercase();
        let message = err.to_string();

        match &err {
            BluehackError::Validation { .. } => Self::BadRequest {
                error_code,
                message,
            },
            BluehackError::PlatformDenied(_) => Self::Forbidden {
                error_code,
                message,
            },
            BluehackError::PlatformCancelled | BluehackError::ScanInProgress => Self::Conflict {
                error_code,
                message,
            },
            BluehackError::PlatformFailed(detail) => Self::BadGateway {
                error_code,
                message: "Bluetooth discovery failed".to_string(),
                details: Some(detail.clone()),
            },
            BluehackError::PlatformUnsupported => Self::ServiceUnavailable {
                error_code,
                message,
            },
            BluehackError::ConfigNotFound(_)
            | BluehackError::ConfigParseError(_)
            | BluehackError::ConfigValidationError(_)
            | BluehackError::Serialization(_) => Self::InternalError {
                error_code,
                message: "Internal server error".to_string(),
                details: Some(message),
            },
        }
    }
}
