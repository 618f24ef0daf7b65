//! Submission error types.

use std::time::Duration;

use holodeck_shared::AppError;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::storage::StorageError;

/// Submission pipeline errors.
///
/// Each variant names the phase that failed; only the first failure of a
/// submission is reported. The inner error is rendered into the message
/// rather than exposed as a source.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Saving the image failed.
    #[error("storage write failed: {0}")]
    StorageWriteFailed(StorageError),

    /// The analysis call failed.
    #[error("analysis failed: {0}")]
    AnalysisFailed(AnalysisError),

    /// The analysis reply could not be parsed.
    #[error("analysis response malformed: {0}")]
    AnalysisResponseMalformed(AnalysisError),

    /// Writing metadata after both branches succeeded failed.
    #[error("metadata write failed: {0}")]
    MetadataWriteFailed(StorageError),

    /// Branches did not both finish before the deadline.
    #[error("submission timed out after {0:?}")]
    TimedOut(Duration),

    /// The submission was cancelled by its caller.
    #[error("submission cancelled")]
    Cancelled,

    /// A pipeline task panicked or was aborted.
    #[error("pipeline task failed: {0}")]
    TaskFailed(String),
}

impl From<AnalysisError> for SubmissionError {
    fn from(err: AnalysisError) -> Self {
        if err.is_malformed() {
            Self::AnalysisResponseMalformed(err)
        } else {
            Self::AnalysisFailed(err)
        }
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        let detail = err.to_string();
        match err {
            SubmissionError::AnalysisResponseMalformed(_) => Self::Parse(detail),
            SubmissionError::StorageWriteFailed(_)
            | SubmissionError::AnalysisFailed(_)
            | SubmissionError::MetadataWriteFailed(_)
            | SubmissionError::TimedOut(_) => Self::ExternalService(detail),
            SubmissionError::Cancelled | SubmissionError::TaskFailed(_) => Self::Internal(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_analysis_is_distinct() {
        let err = SubmissionError::from(AnalysisError::malformed("not json"));
        assert!(matches!(err, SubmissionError::AnalysisResponseMalformed(_)));

        let err = SubmissionError::from(AnalysisError::EmptyResponse);
        assert!(matches!(err, SubmissionError::AnalysisFailed(_)));
    }

    #[test]
    fn test_display_names_phase() {
        let err = SubmissionError::MetadataWriteFailed(StorageError::not_found("x.png"));
        assert_eq!(err.to_string(), "metadata write failed: object not found: x.png");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = SubmissionError::from(AnalysisError::malformed("x")).into();
        assert!(matches!(app, AppError::Parse(_)));
        assert_eq!(app.status_code(), 500);

        let app: AppError =
            SubmissionError::StorageWriteFailed(StorageError::operation("denied")).into();
        assert!(matches!(app, AppError::ExternalService(_)));

        let app: AppError = SubmissionError::TimedOut(Duration::from_secs(1)).into();
        assert_eq!(app.status_code(), 500);
    }
}
