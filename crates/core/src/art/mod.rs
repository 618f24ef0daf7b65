//! Artwork submission pipeline and listing.
//!
//! This module provides:
//! - Concurrent storage + analysis of a submitted image
//! - Metadata write after both branches succeed
//! - Favorites listing with signed URLs

mod error;
mod service;
mod types;

pub use error::SubmissionError;
pub use service::ArtService;
pub use types::{
    AnalysisResult, ArtPiece, ArtworkMetadata, SubmissionResult, SubmissionStatus, TAG_DELIMITER,
    join_tags, split_tags,
};
