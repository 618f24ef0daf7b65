//! Art service implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::SubmissionError;
use super::types::{AnalysisResult, ArtPiece, ArtworkMetadata, SubmissionResult};
use crate::analysis::AnalysisProvider;
use crate::storage::{StorageError, StorageProvider};

/// Service for submitting and listing artwork.
pub struct ArtService {
    storage: Arc<dyn StorageProvider>,
    analyzer: Arc<dyn AnalysisProvider>,
    branch_timeout: Duration,
}

impl ArtService {
    /// Default deadline for both branches of a submission.
    pub const DEFAULT_BRANCH_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a new art service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageProvider>, analyzer: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            storage,
            analyzer,
            branch_timeout: Self::DEFAULT_BRANCH_TIMEOUT,
        }
    }

    /// Set the branch deadline.
    #[must_use]
    pub fn with_branch_timeout(mut self, timeout: Duration) -> Self {
        self.branch_timeout = timeout;
        self
    }

    /// Store and analyse an image, then annotate the stored object.
    ///
    /// Dropping the returned future cancels both in-flight branches.
    ///
    /// # Errors
    ///
    /// Returns the first branch failure, a timeout, or a metadata write failure.
    pub async fn submit(&self, image: Bytes) -> Result<SubmissionResult, SubmissionError> {
        self.submit_with_cancel(image, CancellationToken::new())
            .await
    }

    /// Like [`ArtService::submit`], additionally cancelled through `request`.
    ///
    /// Cancellation only reaches the save and analysis branches. Once both
    /// have succeeded the metadata write runs to completion.
    ///
    /// # Errors
    ///
    /// Returns the first branch failure, a timeout, cancellation, or a
    /// metadata write failure.
    pub async fn submit_with_cancel(
        &self,
        image: Bytes,
        request: CancellationToken,
    ) -> Result<SubmissionResult, SubmissionError> {
        let (object_id, analysis) = self.run_branches(image, &request).await?;

        let metadata = ArtworkMetadata::from_analysis(&analysis, Utc::now());
        self.write_metadata(object_id.clone(), metadata)
            .await
            .map_err(SubmissionError::MetadataWriteFailed)?;

        info!(object_id = %object_id, title = %analysis.title, "Artwork processed");
        Ok(SubmissionResult::processed(object_id, analysis))
    }

    /// List favorited artwork.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    pub async fn list_favorites(&self) -> Result<Vec<ArtPiece>, StorageError> {
        self.storage.list_favorites().await
    }

    /// Run save and analysis concurrently and join on both.
    async fn run_branches(
        &self,
        image: Bytes,
        request: &CancellationToken,
    ) -> Result<(String, AnalysisResult), SubmissionError> {
        let scope = request.child_token();
        let _scope_guard = scope.clone().drop_guard();

        let storage = Arc::clone(&self.storage);
        let save_image = image.clone();
        let save = spawn_branch(&scope, async move {
            storage
                .save(save_image)
                .await
                .map_err(SubmissionError::StorageWriteFailed)
        });

        let analyzer = Arc::clone(&self.analyzer);
        let analyze = spawn_branch(&scope, async move {
            analyzer
                .analyze_image(image)
                .await
                .map_err(SubmissionError::from)
        });

        debug!(timeout = ?self.branch_timeout, "Submission branches started");
        let joined = async { tokio::try_join!(join_branch(save), join_branch(analyze)) };

        match tokio::time::timeout(self.branch_timeout, joined).await {
            Ok(Ok(pair)) => Ok(pair),
            Ok(Err(err)) => {
                warn!(error = %err, "Submission branch failed, cancelling sibling");
                scope.cancel();
                Err(err)
            }
            Err(_) => {
                warn!(timeout = ?self.branch_timeout, "Submission branches timed out");
                scope.cancel();
                Err(SubmissionError::TimedOut(self.branch_timeout))
            }
        }
    }

    /// Write metadata on its own task so it outlives a dropped caller.
    async fn write_metadata(
        &self,
        object_id: String,
        metadata: ArtworkMetadata,
    ) -> Result<(), StorageError> {
        let storage = Arc::clone(&self.storage);
        let write =
            tokio::spawn(async move { storage.set_metadata(&object_id, &metadata).await });

        write
            .await
            .map_err(|e| StorageError::operation(format!("metadata task failed: {e}")))?
    }
}

/// Spawn one branch that stops early when `scope` is cancelled.
fn spawn_branch<T, F>(
    scope: &CancellationToken,
    work: F,
) -> JoinHandle<Result<T, SubmissionError>>
where
    T: Send + 'static,
    F: Future<Output = Result<T, SubmissionError>> + Send + 'static,
{
    let scope = scope.clone();
    tokio::spawn(async move {
        tokio::select! {
            biased;
            () = scope.cancelled() => Err(SubmissionError::Cancelled),
            result = work => result,
        }
    })
}

async fn join_branch<T>(handle: JoinHandle<Result<T, SubmissionError>>) -> Result<T, SubmissionError> {
    handle
        .await
        .map_err(|e| SubmissionError::TaskFailed(e.to_string()))?
}
