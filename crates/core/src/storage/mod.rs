//! Object storage for submitted artwork using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: GCS interoperability, Cloudflare R2, AWS S3
//! - Local filesystem (development only)
//! - In-process memory (tests)
//!
//! # Layout
//!
//! ```text
//! art/{uuid}.png              image bytes
//! metadata/{uuid}.png.json    ArtworkMetadata sidecar
//! ```

mod config;
mod error;
mod provider;
mod service;

pub use config::{StorageBackend, StorageConfig};
pub use error::StorageError;
pub use provider::StorageProvider;
pub use service::StorageService;

#[cfg(test)]
pub use provider::MockStorageProvider;
