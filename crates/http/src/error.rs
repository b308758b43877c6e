//! Error handling for the ANE HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Standard error response format for all HTTP errors.
///
/// The body is flat so browser clients can read `message` directly.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub trace_id: String,
    pub timestamp: String,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {message}")]
    Configuration { message: String, code: String },

    #[error("upstream error ({status}): {message}")]
    Upstream {
        status: StatusCode,
        message: String,
        code: String,
        error: Option<String>,
    },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("{message}: {cause:#}")]
    Internal {
        message: String,
        cause: anyhow::Error,
    },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            code: "configuration_error".to_string(),
        }
    }

    /// Create an upstream error that reports `status` to the caller.
    ///
    /// Statuses that are not errors are reported as `502 Bad Gateway`.
    pub fn upstream(status: u16, message: impl Into<String>, error: Option<String>) -> Self {
        let status = StatusCode::from_u16(status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY);

        Self::Upstream {
            status,
            message: message.into(),
            code: "upstream_error".to_string(),
            error,
        }
    }

    /// Create an upstream timeout error
    pub fn upstream_timeout(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: StatusCode::GATEWAY_TIMEOUT,
            message: message.into(),
            code: "upstream_timeout".to_string(),
            error: None,
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create an internal error with a caller-facing message.
    ///
    /// `cause` is logged but never sent to the client.
    pub fn internal(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message: message.into(),
            cause: cause.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Configuration { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Upstream { status, .. } => *status,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc().to_string();
        let status = self.status();

        let (code, message, error) = match self {
            AppError::Configuration { message, code } => {
                tracing::error!(
                    error_id = %error_id,
                    error_code = %code,
                    "{message}"
                );
                (code, message, None)
            }
            AppError::Upstream {
                message,
                code,
                error,
                ..
            } => {
                tracing::warn!(
                    error_id = %error_id,
                    error_code = %code,
                    status_code = %status.as_u16(),
                    "{message}"
                );
                (code, message, error)
            }
            AppError::NotFound { message, code } => (code, message, None),
            AppError::Internal { message, cause } => {
                tracing::error!(
                    error_id = %error_id,
                    error = ?cause,
                    "{message}"
                );
                ("internal_error".to_string(), message, None)
            }
        };

        tracing::debug!(
            error_id = %error_id,
            error_code = %code,
            status_code = %status.as_u16(),
            "Request error"
        );

        let body = ErrorBody {
            message,
            code,
            error,
            trace_id: error_id.to_string(),
            timestamp,
        };

        (status, Json(body)).into_response()
    }
}
