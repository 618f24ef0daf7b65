//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad, missing or oversized input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Caller exceeded the submission rate.
    #[error("Rate limit exceeded: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds the caller should wait before retrying.
        retry_after_secs: u64,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Route exists but not for this method.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Object storage or analysis backend failed.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Analysis reply could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::RateLimited { .. } => 429,
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::ExternalService(_) | Self::Parse(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the message that is safe to show to API callers.
    ///
    /// Validation messages describe the caller's own input and are passed
    /// through. Everything else collapses to a generic message.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::RateLimited { retry_after_secs } => {
                format!("Rate limit exceeded. Please wait {retry_after_secs} seconds.")
            }
            Self::NotFound(_) => "Resource not found".to_string(),
            Self::MethodNotAllowed(_) => "Method not allowed".to_string(),
            Self::ExternalService(_) | Self::Parse(_) | Self::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }

    /// Whether the error is the caller's fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
