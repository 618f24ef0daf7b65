//! Rendering of application errors as JSON responses.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use holodeck_core::art::SubmissionError;
use holodeck_core::storage::StorageError;
use holodeck_shared::AppError;
use serde_json::json;
use tracing::{error, warn};

/// Handler error carrying an [`AppError`].
///
/// The internal detail is logged; the body only carries the public message.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Caller input was rejected.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl From<SubmissionError> for ApiError {
    fn from(error: SubmissionError) -> Self {
        Self(error.into())
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.0;
        if error.is_client_error() {
            warn!(code = error.error_code(), error = %error, "Request rejected");
        } else {
            error!(code = error.error_code(), error = %error, "Request failed");
        }

        let status =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": error.error_code(),
            "message": error.public_message(),
        }));

        let mut response = (status, body).into_response();
        if let AppError::RateLimited { retry_after_secs } = error {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError(AppError::RateLimited {
            retry_after_secs: 60,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "60");
    }

    #[test]
    fn test_server_error_status() {
        let response = ApiError::from(SubmissionError::Cancelled).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(RETRY_AFTER).is_none());
    }

    #[test]
    fn test_validation_status() {
        let response = ApiError::validation("no image").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
