//! Artwork submission and favorites routes.

use std::fmt::Display;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    routing::{get, post},
};
use bytes::{Bytes, BytesMut};
use holodeck_core::art::{ArtPiece, SubmissionResult};
use holodeck_shared::AppError;
use serde::Serialize;
use tracing::debug;

use super::{method_not_allowed, preflight};
use crate::{ApiError, AppState, UploadLimits, middleware::ClientIdentity};

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// Creates the artwork routes.
pub fn routes(limits: &UploadLimits) -> Router<AppState> {
    Router::new()
        .route(
            "/art",
            post(submit_art)
                .options(preflight)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(limits.max_form_bytes)),
        )
        .route(
            "/art/favorites",
            get(list_favorites)
                .options(preflight)
                .fallback(method_not_allowed),
        )
}

/// Response for the favorites listing.
#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    /// Favorited pieces, in no particular order.
    pub pieces: Vec<ArtPiece>,
}

/// POST `/art`
///
/// Rate-limits the caller, reads the `image` field, then runs the pipeline.
async fn submit_art(
    State(state): State<AppState>,
    client: ClientIdentity,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SubmissionResult>), ApiError> {
    if !state.rate_limiter.allow(client.as_str()) {
        return Err(AppError::RateLimited {
            retry_after_secs: state.rate_limiter.window().as_secs(),
        }
        .into());
    }

    let mut multipart = multipart.map_err(invalid_form)?;
    let image = read_image(&mut multipart, state.limits.max_image_bytes).await?;
    debug!(client = %client.as_str(), bytes = image.len(), "Submission accepted");

    let result = state.art.submit(image).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// GET `/art/favorites`
async fn list_favorites(
    State(state): State<AppState>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let pieces = state.art.list_favorites().await?;
    Ok(Json(FavoritesResponse { pieces }))
}

/// Read the image field, enforcing the size cap while streaming.
async fn read_image(multipart: &mut Multipart, max_bytes: usize) -> Result<Bytes, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(invalid_form)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let mut image = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(invalid_form)? {
            if image.len() + chunk.len() > max_bytes {
                return Err(ApiError::validation(format!(
                    "Image exceeds the {max_bytes} byte limit"
                )));
            }
            image.extend_from_slice(&chunk);
        }

        if image.is_empty() {
            return Err(ApiError::validation("Image is empty"));
        }
        return Ok(image.freeze());
    }

    Err(ApiError::validation("Missing 'image' field"))
}

fn invalid_form(err: impl Display) -> ApiError {
    debug!(error = %err, "Unreadable multipart form");
    ApiError::validation("Invalid multipart form")
}
