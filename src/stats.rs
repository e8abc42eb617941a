//! Index statistics and shard chain verification.
//!
//! `postindex stats` reads the summary and every shard through the same
//! [`ShardSource`] the client uses, checks that the shards form one
//! consistent, newest-first chain, and prints a summary. A broken chain
//! makes the command fail, which is what a deploy check wants.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::NaiveDate;

use postindex_core::filter::{tag_facets, TagFacet};
use postindex_core::shard::newest_first;
use postindex_core::source::{fetch_shard, fetch_summary, ShardLayout, ShardSource};
use postindex_core::{IndexSummary, Item, Shard};

use crate::config::Config;
use crate::fetch::open_source;

#[derive(Debug, Clone)]
pub struct IndexStats {
    pub summary: IndexSummary,
    pub items: usize,
    pub newest: Option<NaiveDate>,
    pub oldest: Option<NaiveDate>,
    pub top_tags: Vec<TagFacet>,
    pub problems: Vec<String>,
}

/// Check `shards` against `summary`. Returns one line per problem.
pub fn verify_chain(summary: &IndexSummary, shards: &[Shard]) -> Vec<String> {
    let mut problems = Vec::new();

    if shards.len() as u32 != summary.total_pages {
        problems.push(format!(
            "summary lists {} pages, found {}",
            summary.total_pages,
            shards.len()
        ));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut previous: Option<&Item> = None;
    let mut count = 0u32;

    for (i, shard) in shards.iter().enumerate() {
        let expected = i as u32 + 1;
        if shard.page != expected {
            problems.push(format!("shard {} reports page {}", expected, shard.page));
        }
        if shard.total_pages != summary.total_pages
            || shard.total_posts != summary.total_posts
            || shard.per_page != summary.per_page
        {
            problems.push(format!("page {} totals disagree with the summary", shard.page));
        }
        let is_last = expected == summary.total_pages;
        if !is_last && shard.posts.len() as u32 != summary.per_page {
            problems.push(format!(
                "page {} holds {} items, expected {}",
                shard.page,
                shard.posts.len(),
                summary.per_page
            ));
        }

        for item in &shard.posts {
            count += 1;
            if !seen.insert(item.slug.as_str()) {
                problems.push(format!("slug '{}' appears more than once", item.slug));
            }
            if let Some(prev) = previous {
                if newest_first(prev, item) == std::cmp::Ordering::Greater {
                    problems.push(format!(
                        "'{}' is out of order after '{}' on page {}",
                        item.slug, prev.slug, shard.page
                    ));
                }
            }
            previous = Some(item);
        }
    }

    if count != summary.total_posts {
        problems.push(format!(
            "summary counts {} items, shards hold {}",
            summary.total_posts, count
        ));
    }

    problems
}

/// Load the whole index from `source` and compute [`IndexStats`].
pub async fn collect_stats(source: &dyn ShardSource, layout: &ShardLayout) -> Result<IndexStats> {
    let summary = fetch_summary(source, layout).await?;
    let mut shards = Vec::with_capacity(summary.total_pages as usize);
    for page in 1..=summary.total_pages {
        shards.push(fetch_shard(source, layout, page).await?);
    }

    let problems = verify_chain(&summary, &shards);
    let items: Vec<Item> = shards.into_iter().flat_map(|s| s.posts).collect();
    let mut top_tags = tag_facets(&items);
    top_tags.truncate(10);

    Ok(IndexStats {
        summary,
        items: items.len(),
        newest: items.iter().map(|i| i.date).max(),
        oldest: items.iter().map(|i| i.date).min(),
        top_tags,
        problems,
    })
}

/// Run the stats command against the configured client base.
pub async fn run_stats(config: &Config) -> Result<()> {
    let base = config.client_base();
    let source = open_source(
        &base,
        Duration::from_millis(config.client.fetch_timeout_ms),
    )?;
    let stats = collect_stats(source.as_ref(), &config.output.layout()).await?;

    println!("postindex: index stats");
    println!("======================");
    println!();
    println!("  Source:      {}", source.describe());
    println!("  Items:       {}", stats.summary.total_posts);
    println!("  Pages:       {}", stats.summary.total_pages);
    println!("  Per page:    {}", stats.summary.per_page);
    if let (Some(newest), Some(oldest)) = (stats.newest, stats.oldest) {
        println!("  Newest:      {}", newest);
        println!("  Oldest:      {}", oldest);
    }

    if !stats.top_tags.is_empty() {
        println!();
        println!("  Top tags:");
        println!("  {:<24} {:>6}", "TAG", "ITEMS");
        println!("  {}", "-".repeat(31));
        for facet in &stats.top_tags {
            println!("  {:<24} {:>6}", facet.tag, facet.count);
        }
    }
    println!();

    if !stats.problems.is_empty() {
        for problem in &stats.problems {
            eprintln!("  problem: {}", problem);
        }
        bail!("Index verification failed: {} problem(s)", stats.problems.len());
    }

    println!("  Chain OK");
    Ok(())
}
