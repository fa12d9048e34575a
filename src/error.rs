//! Error types for media-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (worker failures, configuration, requests)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
///
/// Download jobs never surface this type to clients directly: every job failure is
/// folded into a terminal [`JobResult::Failed`](crate::types::JobResult) event. It is
/// returned by setup code and by the single-shot size estimation flow.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// Request rejected before reaching the download core
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// External worker failed
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failures reported by the external extraction worker
///
/// `Failed` and `AuthRequired` render the worker's own message verbatim so clients see
/// exactly what the worker said.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// Worker exited unsuccessfully (or could not be started)
    #[error("{message}")]
    Failed {
        /// The worker's failure message
        message: String,
    },

    /// Worker asked for a signed-in session and no credentials were available
    #[error("{message}")]
    AuthRequired {
        /// The worker's failure message
        message: String,
    },

    /// The credentialed retry failed as well
    #[error("retry with credentials failed: {message}")]
    RetryFailed {
        /// The failure message of the retry attempt
        message: String,
    },

    /// Worker succeeded but its metadata output could not be read
    #[error("unreadable worker metadata: {0}")]
    Metadata(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_request",
///     "message": "invalid request: host example.org is not allowed"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "invalid_request", "auth_required")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,

            // 401 Unauthorized - the media itself needs a signed-in session
            Error::Worker(WorkerError::AuthRequired { .. }) => 401,

            // 502 Bad Gateway - the external worker failed
            Error::Worker(_) => 502,

            // 500 Internal Server Error - Server-side issues
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Worker(e) => match e {
                WorkerError::Failed { .. } => "worker_failed",
                WorkerError::AuthRequired { .. } => "auth_required",
                WorkerError::RetryFailed { .. } => "retry_failed",
                WorkerError::Metadata(_) => "worker_metadata",
            },
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config {
                key: Some(key), ..
            } => Some(serde_json::json!({ "key": key })),
            _ => None,
        };

        match details {
            Some(details) => ApiError::with_details(code, message, details),
            None => ApiError::new(code, message),
        }
    }
}
