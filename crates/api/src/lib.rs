//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Client identity extraction
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::{Method, header::CONTENT_TYPE};
use holodeck_core::art::ArtService;
use holodeck_core::rate_limit::RateLimiter;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Size caps applied to uploads before the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Largest accepted image.
    pub max_image_bytes: usize,
    /// Largest accepted multipart body.
    pub max_form_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_image_bytes: 5 << 20,
            max_form_bytes: 10 << 20,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Submission pipeline and favorites listing.
    pub art: Arc<ArtService>,
    /// Per-client submission cooldown.
    pub rate_limiter: Arc<RateLimiter>,
    /// Upload size caps.
    pub limits: UploadLimits,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE]),
        )
        .with_state(state)
}
