//! Data types flowing through the build pipeline.
//!
//! The published item and shard types live in `postindex_core::models`;
//! these are the builder-side types that never leave the process.

use std::path::PathBuf;

use thiserror::Error;

/// Raw candidate produced by the scanner before metadata extraction.
#[derive(Debug, Clone)]
pub struct SourceItem {
    /// Item directory name; the fallback slug.
    pub source_id: String,
    /// Path of the page the metadata is read from.
    pub path: PathBuf,
    pub body: String,
}

/// Why a candidate was left out of the index. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no {0} found")]
    MissingIndexFile(String),
    #[error("could not read: {0}")]
    Unreadable(String),
    #[error("missing post-date")]
    MissingDate,
    #[error("invalid date format '{0}'")]
    InvalidDate(String),
    #[error("slug '{0}' already used by another item")]
    DuplicateSlug(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub source_id: String,
    pub reason: SkipReason,
}
