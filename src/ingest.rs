//! Build pipeline orchestration.
//!
//! Coordinates the full build: scan → extract → validate → sort → partition
//! → render outputs → compare with disk → write. [`build`] is a pure
//! function of the item set on disk; [`run_build`] adds change detection and
//! the writes.
//!
//! Individual items that cannot be indexed are skipped with a warning.
//! Only a missing content root (or an unwritable output directory) aborts
//! the build, and it aborts before anything is written.

use std::collections::HashSet;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, warn};

use postindex_core::shard::{partition, sort_newest_first, summarize};
use postindex_core::{IndexSummary, Item, Shard};

use crate::config::Config;
use crate::connector_fs::{self, ScanOutcome};
use crate::export;
use crate::extract::{extract_meta, first_of};
use crate::feed::{feed_channel, feed_entries, FeedChannel, FeedEntry};
use crate::models::{SkipReason, SkippedItem, SourceItem};
use crate::output::{self, WritePlan};
use crate::progress::{BuildProgressEvent, BuildProgressReporter};
use crate::sitemap::{sitemap_entries, SitemapEntry};

/// Everything derived from one sorted item list.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Newest-first, `slug` ascending within a date.
    pub items: Vec<Item>,
    pub shards: Vec<Shard>,
    pub summary: IndexSummary,
    pub sitemap_entries: Vec<SitemapEntry>,
    pub feed_channel: FeedChannel,
    pub feed_entries: Vec<FeedEntry>,
    pub skipped: Vec<SkippedItem>,
}

/// What a build run did.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub items: usize,
    pub pages: u32,
    pub skipped: usize,
    pub changed: bool,
    pub written: Vec<String>,
    pub removed: Vec<String>,
    pub fingerprint: String,
}

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Turn a scanned page into an [`Item`], or say why it cannot be indexed.
pub fn normalize(source: &SourceItem) -> Result<Item, SkipReason> {
    let meta = extract_meta(&source.body);

    let slug = first_of(&meta, &["post-slug"])
        .unwrap_or(&source.source_id)
        .to_string();

    let raw_date = first_of(&meta, &["post-date"]).ok_or(SkipReason::MissingDate)?;
    let date = parse_date(raw_date).ok_or_else(|| SkipReason::InvalidDate(raw_date.to_string()))?;

    let updated = match first_of(&meta, &["post-updated"]) {
        Some(raw) => {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                warn!(slug = %slug, value = raw, "ignoring invalid post-updated");
            }
            parsed
        }
        None => None,
    };

    let title = first_of(&meta, &["post-title", "title"])
        .unwrap_or(&slug)
        .to_string();
    let summary = first_of(&meta, &["post-summary", "description"])
        .unwrap_or_default()
        .to_string();
    let thumbnail = first_of(&meta, &["post-thumb"]).map(str::to_string);
    let tags = first_of(&meta, &["post-tags"])
        .map(split_tags)
        .unwrap_or_default();

    Ok(Item {
        url: Item::url_for(&slug),
        slug,
        title,
        date,
        updated,
        summary,
        thumbnail,
        tags,
    })
}

/// Comma-separated list, trimmed, empties and repeats dropped, order kept.
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Derive every output from a scan. Pure: same scan, same output.
pub fn build_from_scan(
    config: &Config,
    scan: ScanOutcome,
    progress: &dyn BuildProgressReporter,
) -> BuildOutput {
    let mut skipped = scan.skipped;
    let mut items = Vec::with_capacity(scan.items.len());
    let mut seen_slugs: HashSet<String> = HashSet::new();
    let total = scan.items.len() as u64;

    for (i, source) in scan.items.iter().enumerate() {
        match normalize(source) {
            Ok(item) if !seen_slugs.insert(item.slug.clone()) => {
                warn!(dir = %source.source_id, slug = %item.slug, "duplicate slug, skipping");
                skipped.push(SkippedItem {
                    source_id: source.source_id.clone(),
                    reason: SkipReason::DuplicateSlug(item.slug),
                });
            }
            Ok(item) => items.push(item),
            Err(reason) => {
                warn!(dir = %source.source_id, reason = %reason, "skipping item");
                skipped.push(SkippedItem {
                    source_id: source.source_id.clone(),
                    reason,
                });
            }
        }
        progress.report(BuildProgressEvent::Extracting {
            n: i as u64 + 1,
            total,
        });
    }

    sort_newest_first(&mut items);

    let per_page = config.output.per_page;
    let shards = partition(&items, per_page);
    let summary = summarize(items.len(), per_page);

    BuildOutput {
        sitemap_entries: sitemap_entries(config, &items),
        feed_channel: feed_channel(config, &items),
        feed_entries: feed_entries(config, &items, config.output.feed_limit),
        shards,
        summary,
        skipped,
        items,
    }
}

/// Scan the content root and derive every output.
pub fn build(config: &Config, progress: &dyn BuildProgressReporter) -> Result<BuildOutput> {
    progress.report(BuildProgressEvent::Discovering {
        root: config.content.root.display().to_string(),
    });
    let scan = connector_fs::scan_posts(&config.content)?;
    Ok(build_from_scan(config, scan, progress))
}

/// Build, compare with the output directory, and write what changed.
///
/// With `dry_run`, the comparison is reported but nothing is touched.
pub fn run_build(
    config: &Config,
    dry_run: bool,
    progress: &dyn BuildProgressReporter,
) -> Result<BuildReport> {
    let output = build(config, progress)?;
    let files = export::render_outputs(config, &output)?;
    progress.report(BuildProgressEvent::Comparing {
        files: files.len() as u64,
    });

    let layout = config.output.layout();
    let plan: WritePlan = output::plan(&config.output.dir, &layout, output.summary.total_pages, files)?;

    let report = BuildReport {
        items: output.items.len(),
        pages: output.summary.total_pages,
        skipped: output.skipped.len(),
        changed: plan.has_changes(),
        written: plan.changed.iter().map(|f| f.name.clone()).collect(),
        removed: plan.stale.clone(),
        fingerprint: plan.fingerprint.clone(),
    };

    if !report.changed {
        info!(fingerprint = %report.fingerprint, "no changes");
    } else if dry_run {
        info!(
            written = report.written.len(),
            removed = report.removed.len(),
            "dry run, leaving output untouched"
        );
    } else {
        output::apply(&config.output.dir, &plan)?;
        info!(
            written = report.written.len(),
            removed = report.removed.len(),
            "index updated"
        );
    }

    Ok(report)
}
