//! API route definitions.

use axum::{Router, http::Method, http::StatusCode};
use holodeck_shared::AppError;

use crate::{ApiError, AppState};

pub mod art;
pub mod health;

/// Creates the API router with all routes.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(art::routes(&state.limits))
}

/// Answers a bare `OPTIONS` request that is not a CORS preflight.
pub(crate) async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Fallback for a known path hit with the wrong method.
pub(crate) async fn method_not_allowed(method: Method) -> ApiError {
    ApiError(AppError::MethodNotAllowed(method.to_string()))
}
