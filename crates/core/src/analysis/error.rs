//! Analysis error types.

use thiserror::Error;

/// Analysis provider errors.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Provider is misconfigured (e.g. missing API key).
    #[error("analysis configuration error: {0}")]
    Configuration(String),

    /// Request never produced an HTTP response.
    #[error("analysis request failed: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status.
    #[error("analysis API returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// Endpoint answered without any completion.
    #[error("analysis API returned no choices")]
    EmptyResponse,

    /// Reply text did not have the expected title/tags shape.
    #[error("malformed analysis reply: {0}")]
    Malformed(String),
}

impl AnalysisError {
    /// Create a malformed reply error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Whether this is a parse failure rather than a transport or API failure.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
