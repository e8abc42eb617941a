//! Sorting, partitioning, and shard payload validation.
//!
//! Shards are derived data. The builder regenerates every shard from the
//! full sorted item list on each run, because page boundaries move whenever
//! the item count changes.
//!
//! # Ordering
//!
//! Items are ordered by `date` descending. Items sharing a date are ordered
//! by `slug` ascending, which makes output independent of directory listing
//! order.

use std::cmp::Ordering;

use crate::error::FetchError;
use crate::models::{IndexSummary, Item, Shard};

/// Newest-first comparator with the `slug` tie-break.
pub fn newest_first(a: &Item, b: &Item) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug))
}

pub fn sort_newest_first(items: &mut [Item]) {
    items.sort_by(newest_first);
}

/// `ceil(total / per_page)`; zero items means zero pages.
pub fn page_count(total: u32, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Build the summary for `total` items.
pub fn summarize(total: usize, per_page: u32) -> IndexSummary {
    let total_posts = count_u32(total);
    IndexSummary {
        page: 1,
        per_page,
        total_posts,
        total_pages: page_count(total_posts, per_page),
    }
}

/// Split an already sorted item list into shards of `per_page` items.
///
/// Shard `n` holds positions `[(n-1)*per_page, n*per_page)`; only the last
/// shard may be partial.
///
/// # Panics
///
/// Panics if `per_page` is zero. Configuration loading rejects that value.
pub fn partition(sorted: &[Item], per_page: u32) -> Vec<Shard> {
    assert!(per_page > 0, "per_page must be > 0");
    let summary = summarize(sorted.len(), per_page);
    sorted
        .chunks(per_page as usize)
        .enumerate()
        .map(|(i, chunk)| Shard {
            page: count_u32(i) + 1,
            per_page,
            total_posts: summary.total_posts,
            total_pages: summary.total_pages,
            posts: chunk.to_vec(),
        })
        .collect()
}

/// Decode and validate a shard payload fetched for `expected_page`.
///
/// Anything that would leave the client with an inconsistent view is
/// rejected as [`FetchError::Malformed`]: undecodable JSON, a page number
/// other than the one requested, more posts than `per_page`, or totals that
/// disagree with each other.
pub fn decode_shard(bytes: &[u8], expected_page: u32, resource: &str) -> Result<Shard, FetchError> {
    let malformed = |reason: String| FetchError::Malformed {
        resource: resource.to_string(),
        reason,
    };

    let shard: Shard = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;

    if shard.page != expected_page {
        return Err(malformed(format!(
            "expected page {}, payload says page {}",
            expected_page, shard.page
        )));
    }
    if shard.per_page == 0 {
        return Err(malformed("per_page is 0".to_string()));
    }
    if count_u32(shard.posts.len()) > shard.per_page {
        return Err(malformed(format!(
            "{} posts exceed per_page {}",
            shard.posts.len(),
            shard.per_page
        )));
    }
    if page_count(shard.total_posts, shard.per_page) != shard.total_pages {
        return Err(malformed(format!(
            "total_pages {} disagrees with {} posts at {} per page",
            shard.total_pages, shard.total_posts, shard.per_page
        )));
    }
    if shard.page > shard.total_pages {
        return Err(malformed(format!(
            "page {} beyond total_pages {}",
            shard.page, shard.total_pages
        )));
    }

    Ok(shard)
}

/// Decode and validate the summary pointer file.
pub fn decode_summary(bytes: &[u8], resource: &str) -> Result<IndexSummary, FetchError> {
    let malformed = |reason: String| FetchError::Malformed {
        resource: resource.to_string(),
        reason,
    };

    let summary: IndexSummary =
        serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;

    if summary.per_page == 0 {
        return Err(malformed("per_page is 0".to_string()));
    }
    if page_count(summary.total_posts, summary.per_page) != summary.total_pages {
        return Err(malformed(format!(
            "total_pages {} disagrees with {} posts at {} per page",
            summary.total_pages, summary.total_posts, summary.per_page
        )));
    }

    Ok(summary)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn item(slug: &str, date: &str) -> Item {
        Item {
            slug: slug.to_string(),
            url: Item::url_for(slug),
            title: format!("Title {}", slug),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            updated: None,
            summary: String::new(),
            thumbnail: None,
            tags: Vec::new(),
        }
    }

    pub(crate) fn dated_items(n: usize) -> Vec<Item> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let mut it = item(&format!("post-{:03}", i), "2024-01-01");
                it.date = base + chrono::Days::new(i as u64);
                it
            })
            .collect()
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 20), 0);
        assert_eq!(page_count(1, 20), 1);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
        assert_eq!(page_count(45, 20), 3);
    }

    #[test]
    fn test_sort_newest_first_with_slug_tiebreak() {
        let mut items = vec![
            item("b", "2024-03-01"),
            item("z", "2024-05-01"),
            item("a", "2024-03-01"),
            item("m", "2023-12-31"),
        ];
        sort_newest_first(&mut items);
        let slugs: Vec<&str> = items.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(slugs, vec!["z", "a", "b", "m"]);
    }

    #[test]
    fn test_sort_independent_of_input_order() {
        let mut forward = vec![
            item("c", "2024-01-01"),
            item("a", "2024-01-01"),
            item("b", "2024-01-01"),
        ];
        let mut reversed: Vec<Item> = forward.iter().rev().cloned().collect();
        sort_newest_first(&mut forward);
        sort_newest_first(&mut reversed);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_partition_45_items() {
        let mut items = dated_items(45);
        sort_newest_first(&mut items);
        let shards = partition(&items, 20);

        assert_eq!(shards.len(), 3);
        let sizes: Vec<usize> = shards.iter().map(|s| s.posts.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
        for (i, shard) in shards.iter().enumerate() {
            assert_eq!(shard.page as usize, i + 1);
            assert_eq!(shard.total_pages, 3);
            assert_eq!(shard.total_posts, 45);
        }
    }

    #[test]
    fn test_partition_concatenation_reproduces_list() {
        for n in [0usize, 1, 19, 20, 21, 40, 57] {
            let mut items = dated_items(n);
            sort_newest_first(&mut items);
            let shards = partition(&items, 20);
            assert_eq!(shards.len() as u32, page_count(n as u32, 20));
            let joined: Vec<Item> = shards.into_iter().flat_map(|s| s.posts).collect();
            assert_eq!(joined, items, "n = {}", n);
        }
    }

    #[test]
    fn test_summarize_matches_partition() {
        let items = dated_items(41);
        let summary = summarize(items.len(), 20);
        assert_eq!(summary.page, 1);
        assert_eq!(summary.total_shards(), partition(&items, 20).len() as u32);
        assert_eq!(summary.total_items(), 41);
    }

    #[test]
    fn test_decode_shard_roundtrip_valid() {
        let shards = partition(&dated_items(25), 10);
        let bytes = serde_json::to_vec(&shards[1]).unwrap();
        let decoded = decode_shard(&bytes, 2, "page 2").unwrap();
        assert_eq!(decoded, shards[1]);
    }

    #[test]
    fn test_decode_shard_wrong_page() {
        let shards = partition(&dated_items(25), 10);
        let bytes = serde_json::to_vec(&shards[0]).unwrap();
        let err = decode_shard(&bytes, 2, "page 2").unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn test_decode_shard_missing_fields() {
        let err = decode_shard(br#"{"page": 1, "posts": []}"#, 1, "page 1").unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
        assert_eq!(err.resource(), "page 1");
    }

    #[test]
    fn test_decode_shard_inconsistent_totals() {
        let body = br#"{"page":1,"per_page":20,"total_posts":45,"total_pages":2,"posts":[]}"#;
        assert!(decode_shard(body, 1, "page 1").is_err());
    }

    #[test]
    fn test_decode_shard_not_json() {
        assert!(decode_shard(b"<html>404</html>", 1, "page 1").is_err());
    }

    #[test]
    fn test_decode_summary_accepts_minimal_pointer() {
        let body = br#"{"page":1,"per_page":20,"total_posts":45,"total_pages":3}"#;
        let summary = decode_summary(body, "summary").unwrap();
        assert_eq!(summary.total_pages, 3);
    }

    #[test]
    fn test_item_wire_names() {
        let mut it = item("hello", "2024-02-03");
        it.thumbnail = Some("/img/hello.png".to_string());
        it.tags = vec!["rust".to_string()];
        let value = serde_json::to_value(&it).unwrap();
        assert_eq!(value["thumb"], "/img/hello.png");
        assert_eq!(value["date"], "2024-02-03");
        assert_eq!(value["url"], "/posts/hello/");
        assert!(value.get("updated").is_none());
    }
}
