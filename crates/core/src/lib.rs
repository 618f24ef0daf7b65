//! Core submission pipeline for Holodeck.
//!
//! This crate contains the artwork pipeline with ZERO web framework dependencies.
//!
//! # Modules
//!
//! - `art` - Submission orchestration and artwork types
//! - `analysis` - Vision model analysis of submitted images
//! - `storage` - Object storage for images and their metadata
//! - `rate_limit` - Per-client submission cooldown

pub mod analysis;
pub mod art;
pub mod rate_limit;
pub mod storage;
