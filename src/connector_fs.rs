//! Filesystem scanner for item directories.
//!
//! Each item is a directory directly under the content root holding an
//! index page (`posts/<name>/index.html`). Candidates come back sorted by
//! directory name so downstream output never depends on listing order.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ContentConfig;
use crate::models::{SkipReason, SkippedItem, SourceItem};

/// Everything the scanner found: readable candidates plus the skips.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub items: Vec<SourceItem>,
    pub skipped: Vec<SkippedItem>,
}

/// Scan the content root.
///
/// A missing or unreadable root is fatal. A directory without an index page,
/// or whose page cannot be read, is recorded as skipped.
pub fn scan_posts(content: &ContentConfig) -> Result<ScanOutcome> {
    let root = &content.root;
    if !root.is_dir() {
        bail!("Content root does not exist: {}", root.display());
    }

    let include_set = build_globset(&content.include_globs)?;
    let exclude_set = build_globset(&content.exclude_globs)?;

    let mut outcome = ScanOutcome::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry =
            entry.with_context(|| format!("Failed to list content root {}", root.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || exclude_set.is_match(&name) {
            debug!(dir = %name, "excluded");
            continue;
        }
        if !content.include_globs.is_empty() && !include_set.is_match(&name) {
            debug!(dir = %name, "not included");
            continue;
        }

        let path = entry.path().join(&content.index_file);
        if !path.is_file() {
            warn!(dir = %entry.path().display(), "no {} found, skipping", content.index_file);
            outcome.skipped.push(SkippedItem {
                source_id: name,
                reason: SkipReason::MissingIndexFile(content.index_file.clone()),
            });
            continue;
        }

        match std::fs::read_to_string(&path) {
            Ok(body) => outcome.items.push(SourceItem {
                source_id: name,
                path,
                body,
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read item, skipping");
                outcome.skipped.push(SkippedItem {
                    source_id: name,
                    reason: SkipReason::Unreadable(e.to_string()),
                });
            }
        }
    }

    Ok(outcome)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}
