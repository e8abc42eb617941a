//! Shard retrieval abstraction.
//!
//! The [`ShardSource`] trait fetches raw bytes by file name; [`ShardLayout`]
//! knows which names hold the summary and each shard. Decoding and
//! validation happen here in the core, so every source fails the same way
//! on a malformed payload.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{IndexSummary, Shard};
use crate::shard::{decode_shard, decode_summary};

pub const DEFAULT_SHARD_PREFIX: &str = "posts-index-page-";
pub const DEFAULT_SUMMARY_FILE: &str = "posts-index.json";

/// File naming shared by the builder and every source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardLayout {
    pub shard_prefix: String,
    pub summary_file: String,
}

impl Default for ShardLayout {
    fn default() -> Self {
        Self {
            shard_prefix: DEFAULT_SHARD_PREFIX.to_string(),
            summary_file: DEFAULT_SUMMARY_FILE.to_string(),
        }
    }
}

impl ShardLayout {
    /// `<prefix><page>.json`
    pub fn shard_file(&self, page: u32) -> String {
        format!("{}{}.json", self.shard_prefix, page)
    }

    /// Inverse of [`shard_file`](Self::shard_file).
    pub fn page_of(&self, file_name: &str) -> Option<u32> {
        file_name
            .strip_prefix(&self.shard_prefix)?
            .strip_suffix(".json")?
            .parse()
            .ok()
            .filter(|page| *page > 0)
    }
}

#[async_trait]
pub trait ShardSource: Send + Sync {
    /// Fetch the raw bytes of `file_name` relative to the index base.
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>, FetchError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Fetch and validate the summary pointer.
pub async fn fetch_summary<S: ShardSource + ?Sized>(
    source: &S,
    layout: &ShardLayout,
) -> Result<IndexSummary, FetchError> {
    let bytes = source.fetch(&layout.summary_file).await?;
    decode_summary(&bytes, &layout.summary_file)
}

/// Fetch and validate shard `page`.
pub async fn fetch_shard<S: ShardSource + ?Sized>(
    source: &S,
    layout: &ShardLayout,
    page: u32,
) -> Result<Shard, FetchError> {
    let name = layout.shard_file(page);
    let bytes = source.fetch(&name).await?;
    decode_shard(&bytes, page, &name)
}

/// In-memory source for tests and embedding.
///
/// Counts fetches so callers can assert that a guarded request never went
/// out.
#[derive(Default)]
pub struct InMemorySource {
    files: RwLock<HashMap<String, Vec<u8>>>,
    fetches: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate with a summary and its shards under `layout`.
    pub fn from_index(layout: &ShardLayout, summary: &IndexSummary, shards: &[Shard]) -> Self {
        let source = Self::new();
        source.insert(
            &layout.summary_file,
            serde_json::to_vec(summary).unwrap_or_default(),
        );
        for shard in shards {
            source.insert(
                &layout.shard_file(shard.page),
                serde_json::to_vec(shard).unwrap_or_default(),
            );
        }
        source
    }

    pub fn insert(&self, name: &str, bytes: Vec<u8>) {
        self.files.write().unwrap().insert(name.to_string(), bytes);
    }

    pub fn remove(&self, name: &str) {
        self.files.write().unwrap().remove(name);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShardSource for InMemorySource {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.files
            .read()
            .unwrap()
            .get(file_name)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                resource: file_name.to_string(),
                status: 404,
            })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard::tests::dated_items;
    use crate::shard::{partition, sort_newest_first, summarize};

    #[test]
    fn test_layout_names() {
        let layout = ShardLayout::default();
        assert_eq!(layout.shard_file(3), "posts-index-page-3.json");
        assert_eq!(layout.page_of("posts-index-page-3.json"), Some(3));
        assert_eq!(layout.page_of("posts-index-page-0.json"), None);
        assert_eq!(layout.page_of("posts-index.json"), None);
        assert_eq!(layout.page_of("posts-index-page-x.json"), None);
    }

    #[tokio::test]
    async fn test_fetch_shard_and_summary() {
        let layout = ShardLayout::default();
        let mut items = dated_items(12);
        sort_newest_first(&mut items);
        let shards = partition(&items, 5);
        let source = InMemorySource::from_index(&layout, &summarize(12, 5), &shards);

        let summary = fetch_summary(&source, &layout).await.unwrap();
        assert_eq!(summary.total_pages, 3);
        let third = fetch_shard(&source, &layout, 3).await.unwrap();
        assert_eq!(third.posts.len(), 2);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_and_malformed() {
        let layout = ShardLayout::default();
        let source = InMemorySource::new();
        let err = fetch_shard(&source, &layout, 1).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                resource: "posts-index-page-1.json".to_string(),
                status: 404
            }
        );

        source.insert("posts-index-page-1.json", b"{\"posts\": 7}".to_vec());
        let err = fetch_shard(&source, &layout, 1).await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }
}
