//! Change detection and writing of rendered outputs.
//!
//! Every rendered file is compared byte-for-byte with what is on disk. Only
//! files that differ are written, and shard files for pages that no longer
//! exist are removed. When nothing differs the output directory is left
//! untouched, so a CI job that rebuilds on every content push does not
//! commit (and re-trigger itself) when nothing changed.
//!
//! Writes go through a temp file in the output directory followed by a
//! rename, so readers never observe a half-written shard. Every changed file
//! is staged before any rename happens, the summary is renamed last, and
//! stale shards are removed only after all renames succeeded. A failed
//! build therefore leaves the previous summary pointing at a complete set of
//! shards.

use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use postindex_core::source::ShardLayout;

use crate::export::OutputFile;

#[derive(Debug, Clone, Default)]
pub struct WritePlan {
    /// Files whose bytes differ from disk (or are missing).
    pub changed: Vec<OutputFile>,
    /// Names of files already up to date.
    pub unchanged: Vec<String>,
    /// Shard files beyond the new page count.
    pub stale: Vec<String>,
    /// SHA-256 over every rendered file, names included.
    pub fingerprint: String,
}

impl WritePlan {
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty() || !self.stale.is_empty()
    }
}

/// Digest of a full output set. Equal sets give equal digests.
pub fn fingerprint(files: &[OutputFile]) -> String {
    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(file.name.as_bytes());
        hasher.update([0u8]);
        hasher.update((file.bytes.len() as u64).to_le_bytes());
        hasher.update(&file.bytes);
    }
    hex::encode(hasher.finalize())
}

/// Compare `files` with the contents of `dir`.
pub fn plan(
    dir: &Path,
    layout: &ShardLayout,
    total_pages: u32,
    files: Vec<OutputFile>,
) -> Result<WritePlan> {
    let mut plan = WritePlan {
        fingerprint: fingerprint(&files),
        ..WritePlan::default()
    };

    for file in files {
        let path = dir.join(&file.name);
        match std::fs::read(&path) {
            Ok(existing) if existing == file.bytes => {
                debug!(file = %file.name, "unchanged");
                plan.unchanged.push(file.name);
            }
            Ok(_) => plan.changed.push(file),
            Err(e) if e.kind() == ErrorKind::NotFound => plan.changed.push(file),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        }
    }

    // The summary goes last so it never announces pages not yet on disk.
    if let Some(pos) = plan
        .changed
        .iter()
        .position(|f| f.name == layout.summary_file)
    {
        let summary = plan.changed.remove(pos);
        plan.changed.push(summary);
    }

    if dir.is_dir() {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list output directory {}", dir.display()))?;
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().to_string();
            if matches!(layout.page_of(&name), Some(page) if page > total_pages) {
                plan.stale.push(name);
            }
        }
        plan.stale.sort();
    }

    Ok(plan)
}

/// Write changed files and remove stale shards.
///
/// Nothing on disk is replaced unless every changed file could be staged.
pub fn apply(dir: &Path, plan: &WritePlan) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    // Temp files left in `staged` are deleted on drop if a later step fails.
    let mut staged = Vec::with_capacity(plan.changed.len());
    for file in &plan.changed {
        staged.push((file, stage(dir, file)?));
    }

    for (file, tmp) in staged {
        let target = dir.join(&file.name);
        tmp.persist(&target)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        debug!(file = %file.name, bytes = file.bytes.len(), "written");
    }

    for name in &plan.stale {
        let path = dir.join(name);
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to remove stale {}", path.display()))?;
        debug!(file = %name, "removed stale shard");
    }

    Ok(())
}

/// Write `file` to a temp file beside its target.
fn stage(dir: &Path, file: &OutputFile) -> Result<NamedTempFile> {
    let target = dir.join(&file.name);
    let parent = target.parent().unwrap_or(dir);
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to stage {} in {}", file.name, parent.display()))?;
    tmp.write_all(&file.bytes)
        .and_then(|_| tmp.flush())
        .with_context(|| format!("Failed to stage {}", file.name))?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, body: &str) -> OutputFile {
        OutputFile {
            name: name.to_string(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_fresh_directory_everything_changes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("out");
        let plan = plan(&dir, &ShardLayout::default(), 1, vec![file("a.json", "1")]).unwrap();
        assert!(plan.has_changes());
        assert_eq!(plan.changed.len(), 1);

        apply(&dir, &plan).unwrap();
        assert_eq!(std::fs::read_to_string(dir.join("a.json")).unwrap(), "1");
    }

    #[test]
    fn test_identical_bytes_are_unchanged() {
        let tmp = tempfile::TempDir::new().unwrap();
        let files = vec![file("a.json", "1"), file("b.xml", "<x/>")];
        let first = plan(tmp.path(), &ShardLayout::default(), 0, files.clone()).unwrap();
        apply(tmp.path(), &first).unwrap();

        let second = plan(tmp.path(), &ShardLayout::default(), 0, files).unwrap();
        assert!(!second.has_changes());
        assert_eq!(second.unchanged, vec!["a.json", "b.xml"]);
        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[test]
    fn test_stale_shards_detected_and_removed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let layout = ShardLayout::default();
        for page in 1..=3 {
            std::fs::write(tmp.path().join(layout.shard_file(page)), "old").unwrap();
        }
        std::fs::write(tmp.path().join("posts-index.json"), "keep").unwrap();

        let files = vec![file(&layout.shard_file(1), "old")];
        let plan = plan(tmp.path(), &layout, 1, files).unwrap();
        assert!(plan.changed.is_empty());
        assert_eq!(plan.stale, vec!["posts-index-page-2.json", "posts-index-page-3.json"]);
        assert!(plan.has_changes());

        apply(tmp.path(), &plan).unwrap();
        assert!(tmp.path().join("posts-index-page-1.json").exists());
        assert!(!tmp.path().join("posts-index-page-3.json").exists());
        assert!(tmp.path().join("posts-index.json").exists());
    }

    #[test]
    fn test_summary_is_written_last() {
        let tmp = tempfile::TempDir::new().unwrap();
        let layout = ShardLayout::default();
        let files = vec![
            file(&layout.shard_file(1), "p1"),
            file(&layout.summary_file, "summary"),
            file("sitemap.xml", "<urlset/>"),
        ];
        let plan = plan(tmp.path(), &layout, 1, files).unwrap();
        let order: Vec<&str> = plan.changed.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(order, vec!["posts-index-page-1.json", "sitemap.xml", "posts-index.json"]);
    }

    #[test]
    fn test_failed_staging_leaves_previous_output_intact() {
        let tmp = tempfile::TempDir::new().unwrap();
        let layout = ShardLayout::default();
        std::fs::write(tmp.path().join(layout.shard_file(1)), "old page 1").unwrap();
        std::fs::write(tmp.path().join(layout.shard_file(2)), "old page 2").unwrap();
        std::fs::write(tmp.path().join(&layout.summary_file), "old summary").unwrap();

        // The second file cannot be staged: its directory does not exist.
        let files = vec![
            file(&layout.shard_file(1), "new page 1"),
            file("missing-dir/x.json", "unreachable"),
            file(&layout.summary_file, "new summary"),
        ];
        let plan = plan(tmp.path(), &layout, 1, files).unwrap();
        assert_eq!(plan.stale, vec!["posts-index-page-2.json"]);

        assert!(apply(tmp.path(), &plan).is_err());

        let read = |name: &str| std::fs::read_to_string(tmp.path().join(name)).unwrap();
        assert_eq!(read("posts-index-page-1.json"), "old page 1");
        assert_eq!(read("posts-index-page-2.json"), "old page 2");
        assert_eq!(read("posts-index.json"), "old summary");

        let mut names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["posts-index-page-1.json", "posts-index-page-2.json", "posts-index.json"]
        );
    }

    #[test]
    fn test_fingerprint_depends_on_names_and_bytes() {
        let a = fingerprint(&[file("a", "1")]);
        assert_eq!(a, fingerprint(&[file("a", "1")]));
        assert_ne!(a, fingerprint(&[file("b", "1")]));
        assert_ne!(a, fingerprint(&[file("a", "2")]));
        assert_eq!(a.len(), 64);
    }
}
