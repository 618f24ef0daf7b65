//! Storage provider contract consumed by the submission pipeline.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::StorageError;
use crate::art::{ArtPiece, ArtworkMetadata};

/// Durable blob storage with application metadata.
///
/// Implementations must be safe to call concurrently from independent
/// submissions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Persist image bytes and return a fresh, never reused object ID.
    async fn save(&self, image: Bytes) -> Result<String, StorageError>;

    /// Attach or overwrite metadata on an existing object.
    ///
    /// Fails with [`StorageError::NotFound`] if the object does not exist.
    async fn set_metadata(
        &self,
        object_id: &str,
        metadata: &ArtworkMetadata,
    ) -> Result<(), StorageError>;

    /// Issue a time-limited read URL for an object.
    async fn signed_url(&self, object_id: &str) -> Result<String, StorageError>;

    /// List every favorited object with a resolved read URL.
    ///
    /// Objects whose URL cannot be issued are left out; order follows the
    /// store's listing order.
    async fn list_favorites(&self) -> Result<Vec<ArtPiece>, StorageError>;
}
