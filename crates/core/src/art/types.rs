//! Artwork types and data structures.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Separator used when tags are flattened into object metadata.
pub const TAG_DELIMITER: char = ',';

/// Joins a tag list into the flat metadata encoding.
#[must_use]
pub fn join_tags(tags: &[String]) -> String {
    tags.join(&TAG_DELIMITER.to_string())
}

/// Splits the flat metadata encoding back into a tag list.
///
/// An empty string yields no tags rather than one empty tag.
#[must_use]
pub fn split_tags(tags: &str) -> Vec<String> {
    if tags.is_empty() {
        return Vec::new();
    }
    tags.split(TAG_DELIMITER).map(str::to_string).collect()
}

/// Title and tags produced by the analysis provider for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Short descriptive title.
    pub title: String,
    /// Descriptive tags, usually three.
    pub tags: Vec<String>,
}

/// Application metadata attached to a stored image.
///
/// Field encodings mirror what the object store holds: tags are
/// comma-joined and the favorite flag is the string `"true"` or `"false"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkMetadata {
    /// Artwork title.
    pub title: String,
    /// Comma-joined tags.
    pub tags: String,
    /// `"true"` when the artwork is favorited.
    pub is_favorite: String,
    /// RFC 3339 timestamp of when the metadata was written.
    pub uploaded_at: String,
}

impl ArtworkMetadata {
    /// Builds fresh, non-favorited metadata from an analysis.
    #[must_use]
    pub fn from_analysis(analysis: &AnalysisResult, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            title: analysis.title.clone(),
            tags: join_tags(&analysis.tags),
            is_favorite: "false".to_string(),
            uploaded_at: uploaded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Returns a copy with the favorite flag set.
    #[must_use]
    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.is_favorite = favorite.to_string();
        self
    }

    /// Whether the favorite flag is set.
    #[must_use]
    pub fn favorited(&self) -> bool {
        self.is_favorite == "true"
    }

    /// Tags as a list.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(&self.tags)
    }

    /// Parsed upload timestamp; the Unix epoch when the stored value is invalid.
    #[must_use]
    pub fn uploaded_at_utc(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&self.uploaded_at)
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_default()
    }
}

/// Processing state reported back to the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Stored, analysed and annotated.
    Processed,
}

/// Summary returned for a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Stored object ID.
    pub id: String,
    /// Generated title.
    pub title: String,
    /// Generated tags.
    pub tags: Vec<String>,
    /// Always `processed`.
    pub status: SubmissionStatus,
}

impl SubmissionResult {
    /// Combines the two branch results of a submission.
    #[must_use]
    pub fn processed(object_id: String, analysis: AnalysisResult) -> Self {
        Self {
            id: object_id,
            title: analysis.title,
            tags: analysis.tags,
            status: SubmissionStatus::Processed,
        }
    }
}

/// Favorited artwork as served by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtPiece {
    /// Stored object ID.
    pub id: String,
    /// Time-limited read URL.
    pub url: String,
    /// Artwork title.
    pub title: String,
    /// Artwork tags.
    pub tags: Vec<String>,
    /// When the artwork was processed.
    pub uploaded_at: DateTime<Utc>,
}

impl ArtPiece {
    /// Builds a listing entry from stored metadata and a resolved URL.
    #[must_use]
    pub fn from_metadata(id: impl Into<String>, url: String, metadata: &ArtworkMetadata) -> Self {
        Self {
            id: id.into(),
            url,
            title: metadata.title.clone(),
            tags: metadata.tag_list(),
            uploaded_at: metadata.uploaded_at_utc(),
        }
    }
}
