//! Analysis provider contract consumed by the submission pipeline.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::AnalysisError;
use crate::art::AnalysisResult;

/// Produces a title and tags for an image.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Analyse image bytes.
    ///
    /// A reply that cannot be parsed is reported as
    /// [`AnalysisError::Malformed`], never as an empty result.
    async fn analyze_image(&self, image: Bytes) -> Result<AnalysisResult, AnalysisError>;
}
