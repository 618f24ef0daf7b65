//! Storage service implementation using Apache OpenDAL.

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use tracing::{debug, warn};
use uuid::Uuid;

use super::config::{StorageBackend, StorageConfig};
use super::error::StorageError;
use super::provider::StorageProvider;
use crate::art::{ArtPiece, ArtworkMetadata};

const IMAGE_PREFIX: &str = "art/";
const METADATA_PREFIX: &str = "metadata/";
const METADATA_SUFFIX: &str = ".json";
const IMAGE_CONTENT_TYPE: &str = "image/png";

/// Object storage for submitted artwork.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be initialized, or if
    /// it cannot presign reads and no public base URL is configured.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.backend)?;

        if config.public_base_url.is_none() && !operator.info().full_capability().presign_read {
            return Err(StorageError::configuration(format!(
                "{} backend cannot presign read URLs; configure a public base URL",
                config.backend.name()
            )));
        }

        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from backend config.
    fn create_operator(backend: &StorageBackend) -> Result<Operator, StorageError> {
        let operator = match backend {
            StorageBackend::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageBackend::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageBackend::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish(),
        };

        Ok(operator)
    }

    /// Generate a fresh object ID.
    ///
    /// Format: `{uuid_v4}.png`
    #[must_use]
    pub fn generate_object_id() -> String {
        format!("{}.png", Uuid::new_v4())
    }

    /// Storage key of the image bytes for an object.
    fn image_key(object_id: &str) -> Result<String, StorageError> {
        validate_object_id(object_id)?;
        Ok(format!("{IMAGE_PREFIX}{object_id}"))
    }

    /// Storage key of the metadata sidecar for an object.
    fn metadata_key(object_id: &str) -> Result<String, StorageError> {
        validate_object_id(object_id)?;
        Ok(format!("{METADATA_PREFIX}{object_id}{METADATA_SUFFIX}"))
    }

    /// Read the metadata sidecar of an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar is missing or cannot be decoded.
    pub async fn metadata(&self, object_id: &str) -> Result<ArtworkMetadata, StorageError> {
        let key = Self::metadata_key(object_id)?;
        self.read_metadata(object_id, &key).await
    }

    async fn read_metadata(
        &self,
        object_id: &str,
        key: &str,
    ) -> Result<ArtworkMetadata, StorageError> {
        let buffer = self.operator.read(key).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::not_found(object_id)
            } else {
                e.into()
            }
        })?;
        Ok(serde_json::from_slice(&buffer.to_vec())?)
    }

    /// Get the storage backend name.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.config.backend.name()
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.backend.bucket()
    }
}

#[async_trait]
impl StorageProvider for StorageService {
    async fn save(&self, image: Bytes) -> Result<String, StorageError> {
        let object_id = Self::generate_object_id();
        let key = Self::image_key(&object_id)?;

        if self
            .operator
            .info()
            .full_capability()
            .write_with_content_type
        {
            self.operator
                .write_with(&key, image)
                .content_type(IMAGE_CONTENT_TYPE)
                .await?;
        } else {
            self.operator.write(&key, image).await?;
        }

        debug!(object_id = %object_id, backend = self.backend_name(), "Image saved");
        Ok(object_id)
    }

    async fn set_metadata(
        &self,
        object_id: &str,
        metadata: &ArtworkMetadata,
    ) -> Result<(), StorageError> {
        let image_key = Self::image_key(object_id)?;
        match self.operator.stat(&image_key).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::not_found(object_id));
            }
            Err(e) => return Err(e.into()),
        }

        let body = serde_json::to_vec(metadata)?;
        self.operator
            .write(&Self::metadata_key(object_id)?, body)
            .await?;
        Ok(())
    }

    async fn signed_url(&self, object_id: &str) -> Result<String, StorageError> {
        let key = Self::image_key(object_id)?;

        match self
            .operator
            .presign_read(&key, self.config.signed_url_ttl())
            .await
        {
            Ok(presigned) => Ok(presigned.uri().to_string()),
            Err(e) if e.kind() == ErrorKind::Unsupported => self
                .config
                .public_base_url
                .as_deref()
                .map(|base| format!("{}/{key}", base.trim_end_matches('/')))
                .ok_or(StorageError::PresignNotSupported),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_favorites(&self) -> Result<Vec<ArtPiece>, StorageError> {
        let entries = match self.operator.list(METADATA_PREFIX).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut objects = 0usize;
        let mut favorites = 0usize;
        let mut pieces = Vec::new();

        for entry in entries {
            if !entry.metadata().mode().is_file() {
                continue;
            }
            let Some(object_id) = entry.name().strip_suffix(METADATA_SUFFIX) else {
                continue;
            };
            objects += 1;

            // Undecodable or concurrently deleted sidecars are skipped; any
            // other read failure fails the whole listing.
            let metadata = match self.read_metadata(object_id, entry.path()).await {
                Ok(metadata) => metadata,
                Err(e @ (StorageError::Serialization(_) | StorageError::NotFound { .. })) => {
                    warn!(object_id = %object_id, error = %e, "Skipping unreadable metadata");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if !metadata.favorited() {
                continue;
            }
            favorites += 1;

            let url = match self.signed_url(object_id).await {
                Ok(url) => url,
                Err(e) => {
                    warn!(object_id = %object_id, error = %e, "Skipping favorite without signed URL");
                    continue;
                }
            };

            pieces.push(ArtPiece::from_metadata(object_id, url, &metadata));
        }

        debug!(objects, favorites, returned = pieces.len(), "Listed favorites");
        Ok(pieces)
    }
}

/// Reject object IDs that could escape their storage prefix.
fn validate_object_id(object_id: &str) -> Result<(), StorageError> {
    let valid = !object_id.is_empty()
        && !object_id.starts_with('.')
        && object_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(object_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::art::AnalysisResult;
    use chrono::Utc;
    use opendal::layers::ChaosLayer;

    fn memory_store() -> StorageService {
        let config = StorageConfig::new(StorageBackend::Memory)
            .with_public_base_url("http://localhost:9000/gallery/");
        StorageService::from_config(config).expect("should create service")
    }

    fn metadata(title: &str, tags: &[&str], favorite: bool) -> ArtworkMetadata {
        let analysis = AnalysisResult {
            title: title.to_string(),
            tags: tags.iter().map(ToString::to_string).collect(),
        };
        ArtworkMetadata::from_analysis(&analysis, Utc::now()).with_favorite(favorite)
    }

    #[test]
    fn test_generate_object_id() {
        let id = StorageService::generate_object_id();
        assert!(id.ends_with(".png"));
        assert!(Uuid::parse_str(id.trim_end_matches(".png")).is_ok());
        assert_ne!(id, StorageService::generate_object_id());
    }

    #[test]
    fn test_validate_object_id() {
        assert!(validate_object_id("6ba7b810-9dad-11d1-80b4-00c04fd430c8.png").is_ok());
        assert!(validate_object_id("").is_err());
        assert!(validate_object_id("../secret").is_err());
        assert!(validate_object_id("art/nested.png").is_err());
        assert!(validate_object_id(".hidden").is_err());
    }

    #[tokio::test]
    async fn test_save_then_set_metadata() {
        let store = memory_store();
        let id = store.save(Bytes::from_static(b"png")).await.unwrap();

        let meta = metadata("Quiet Dunes", &["sand", "wind", "dusk"], false);
        store.set_metadata(&id, &meta).await.unwrap();

        assert_eq!(store.metadata(&id).await.unwrap(), meta);
    }

    #[tokio::test]
    async fn test_set_metadata_missing_object() {
        let store = memory_store();
        let meta = metadata("Ghost", &["none"], false);

        let err = store
            .set_metadata("6ba7b810-9dad-11d1-80b4-00c04fd430c8.png", &meta)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_favorites_filters() {
        let store = memory_store();
        for (title, favorite) in [("One", true), ("Two", false), ("Three", true)] {
            let id = store.save(Bytes::from_static(b"png")).await.unwrap();
            store
                .set_metadata(&id, &metadata(title, &["a", "b", "c"], favorite))
                .await
                .unwrap();
        }

        let pieces = store.list_favorites().await.unwrap();
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            assert!(!piece.url.is_empty());
            assert!(piece.url.starts_with("http://localhost:9000/gallery/art/"));
            assert!(piece.url.ends_with(&piece.id));
        }
        let mut titles: Vec<_> = pieces.iter().map(|p| p.title.as_str()).collect();
        titles.sort_unstable();
        assert_eq!(titles, vec!["One", "Three"]);
    }

    #[tokio::test]
    async fn test_tags_round_trip_through_listing() {
        let store = memory_store();
        let id = store.save(Bytes::from_static(b"png")).await.unwrap();
        store
            .set_metadata(&id, &metadata("Loop", &["x", "y", "z"], true))
            .await
            .unwrap();

        let pieces = store.list_favorites().await.unwrap();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].tags, vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_list_favorites_empty_store() {
        let store = memory_store();
        assert!(store.list_favorites().await.unwrap().is_empty());
    }

    #[test]
    fn test_rejects_backend_without_read_urls() {
        for backend in [
            StorageBackend::Memory,
            StorageBackend::local_fs(std::env::temp_dir().join("holodeck-storage-test")),
        ] {
            let err = StorageService::from_config(StorageConfig::new(backend))
                .err()
                .expect("backend without presign or public URL should be rejected");
            assert!(matches!(err, StorageError::Configuration(_)));
        }
    }

    #[test]
    fn test_local_fs_with_public_base_url() {
        let config = StorageConfig::new(StorageBackend::local_fs(
            std::env::temp_dir().join("holodeck-storage-test"),
        ))
        .with_public_base_url("http://localhost:8080/files");
        assert!(StorageService::from_config(config).is_ok());
    }

    #[tokio::test]
    async fn test_missing_metadata_is_not_found_by_id() {
        let store = memory_store();
        let err = store.metadata("missing.png").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { ref key } if key == "missing.png"));
    }

    #[tokio::test]
    async fn test_sidecar_read_failure_fails_listing() {
        let store = memory_store();
        let id = store.save(Bytes::from_static(b"png")).await.unwrap();
        store
            .set_metadata(&id, &metadata("Flaky", &["a"], true))
            .await
            .unwrap();

        // Every read through this handle fails; listing still works.
        let failing = StorageService {
            operator: store.operator.clone().layer(ChaosLayer::new(1.0)),
            config: store.config.clone(),
        };

        let err = failing.list_favorites().await.unwrap_err();
        assert!(matches!(err, StorageError::Operation(_)));
    }

    #[tokio::test]
    async fn test_unreadable_metadata_is_skipped() {
        let store = memory_store();
        store
            .operator
            .write("metadata/broken.png.json", b"not json".to_vec())
            .await
            .unwrap();
        let id = store.save(Bytes::from_static(b"png")).await.unwrap();
        store
            .set_metadata(&id, &metadata("Fine", &["a"], true))
            .await
            .unwrap();

        let pieces = store.list_favorites().await.unwrap();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].id, id);
    }
}
