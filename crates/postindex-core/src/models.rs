//! Core data types shared by the builder and the client.
//!
//! The serde field names here are the published shard schema: renaming a
//! field is a breaking change for every deployed client.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A single indexed content entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier, unique across the collection.
    pub slug: String,
    /// Canonical retrieval path, e.g. `/posts/<slug>/`.
    pub url: String,
    pub title: String,
    /// Publication date; the only recency key.
    pub date: NaiveDate,
    /// Date of the last revision, if the source declares one.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_date_as_none"
    )]
    pub updated: Option<NaiveDate>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, rename = "thumb", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Display order is preserved; membership checks treat this as a set.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Item {
    /// Canonical url for a slug.
    pub fn url_for(slug: &str) -> String {
        format!("/posts/{}/", slug)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Date used as `lastmod` for crawlers.
    pub fn last_modified(&self) -> NaiveDate {
        self.updated.unwrap_or(self.date)
    }
}

// Older generators wrote `"updated": ""` for items without a revision date.
fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// One page of the newest-first item list, as written to a shard file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
    pub total_posts: u32,
    pub total_pages: u32,
    pub posts: Vec<Item>,
}

/// Pointer file describing the whole index; always points at page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub page: u32,
    pub per_page: u32,
    pub total_posts: u32,
    pub total_pages: u32,
}

impl IndexSummary {
    pub fn total_items(&self) -> u32 {
        self.total_posts
    }

    pub fn total_shards(&self) -> u32 {
        self.total_pages
    }
}
