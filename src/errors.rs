use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use crate::models::ErrorResponse;

/// Message returned to the browser whenever the aggregate cannot be built.
/// Upstream detail is logged, never sent to the client.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to fetch data. Please try again.";

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Error interacting with an external API (network, status, body or circuit).
    ExternalApiError(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into the generic failure response.
    ///
    /// Every variant maps to HTTP 500 with `{success: false, error}`; the
    /// detailed message only reaches the logs.
    fn into_response(self) -> Response {
        match &self {
            AppError::ExternalApiError(msg) => {
                tracing::error!("External API error: {}", msg);
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
            }
        }

        let body = Json(ErrorResponse::new(GENERIC_FAILURE_MESSAGE));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl From<failsafe::Error<AppError>> for AppError {
    fn from(err: failsafe::Error<AppError>) -> Self {
        match err {
            failsafe::Error::Inner(e) => e,
            failsafe::Error::Rejected => {
                AppError::ExternalApiError("circuit breaker open, call rejected".to_string())
            }
        }
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
