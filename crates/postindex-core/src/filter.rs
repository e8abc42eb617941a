//! Local search and tag filtering over the loaded item set.
//!
//! Filtering never touches the network. The visible set is the
//! intersection of the search match and the tag match:
//!
//! - search: case-insensitive substring of the query in the title, the
//!   summary, or the tags joined with `", "`. A blank query matches all.
//! - tag: the item's tags contain the active tag, if one is set.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::Item;

/// Current search/tag criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub query: String,
    pub tag: Option<String>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.tag.is_none()
    }

    /// Set the tag if it is not already active, clear it if it is.
    pub fn toggle_tag(&mut self, tag: &str) {
        if self.tag.as_deref() == Some(tag) {
            self.tag = None;
        } else {
            self.tag = Some(tag.to_string());
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        matches_query(item, &self.query) && self.tag.as_deref().map_or(true, |t| item.has_tag(t))
    }

    /// Items passing the filter, in their loaded order.
    pub fn apply<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

fn matches_query(item: &Item, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    item.title.to_lowercase().contains(&needle)
        || item.summary.to_lowercase().contains(&needle)
        || item.tags.join(", ").to_lowercase().contains(&needle)
}

/// A tag offered by the filter UI, with the number of loaded items carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFacet {
    pub tag: String,
    pub count: usize,
}

/// Tag facets over every loaded item, most used first, then alphabetical.
pub fn tag_facets(items: &[Item]) -> Vec<TagFacet> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        // An item listing a tag twice still counts once.
        let mut seen: Vec<&str> = Vec::with_capacity(item.tags.len());
        for tag in &item.tags {
            if !seen.contains(&tag.as_str()) {
                seen.push(tag);
                *counts.entry(tag).or_insert(0) += 1;
            }
        }
    }

    let mut facets: Vec<TagFacet> = counts
        .into_iter()
        .map(|(tag, count)| TagFacet {
            tag: tag.to_string(),
            count,
        })
        .collect();
    facets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard::tests::item;

    fn tagged(slug: &str, title: &str, summary: &str, tags: &[&str]) -> Item {
        let mut it = item(slug, "2024-01-01");
        it.title = title.to_string();
        it.summary = summary.to_string();
        it.tags = tags.iter().map(|t| t.to_string()).collect();
        it
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let items = vec![tagged("a", "A", "", &[]), tagged("b", "B", "", &["x"])];
        assert_eq!(Filter::default().apply(&items).len(), 2);
        let blank = Filter {
            query: "   ".to_string(),
            tag: None,
        };
        assert!(blank.is_empty());
        assert_eq!(blank.apply(&items).len(), 2);
    }

    #[test]
    fn test_query_is_case_insensitive_over_fields() {
        let items = vec![
            tagged("t", "Rust Ownership", "", &[]),
            tagged("s", "Other", "all about BORROWING", &[]),
            tagged("g", "Third", "", &["Async", "tokio"]),
        ];
        let by = |q: &str| {
            Filter {
                query: q.to_string(),
                tag: None,
            }
            .apply(&items)
            .iter()
            .map(|i| i.slug.clone())
            .collect::<Vec<_>>()
        };
        assert_eq!(by("rust"), vec!["t"]);
        assert_eq!(by("borrow"), vec!["s"]);
        assert_eq!(by("TOKIO"), vec!["g"]);
        assert_eq!(by("async, tok"), vec!["g"]);
        assert!(by("nothing-here").is_empty());
    }

    #[test]
    fn test_intersection_not_union() {
        let items = vec![tagged("1", "one", "", &["a"]), tagged("2", "two", "", &["b"])];
        let filter = Filter {
            query: "b".to_string(),
            tag: Some("a".to_string()),
        };
        assert!(filter.apply(&items).is_empty());
    }

    #[test]
    fn test_toggle_same_tag_twice_clears() {
        let mut filter = Filter::default();
        filter.toggle_tag("rust");
        assert_eq!(filter.tag.as_deref(), Some("rust"));
        filter.toggle_tag("rust");
        assert_eq!(filter, Filter::default());
    }

    #[test]
    fn test_toggle_other_tag_switches() {
        let mut filter = Filter::default();
        filter.toggle_tag("rust");
        filter.toggle_tag("go");
        assert_eq!(filter.tag.as_deref(), Some("go"));
    }

    #[test]
    fn test_tag_match_is_exact() {
        let items = vec![tagged("1", "one", "", &["rust-lang"])];
        let filter = Filter {
            query: String::new(),
            tag: Some("rust".to_string()),
        };
        assert!(filter.apply(&items).is_empty());
    }

    #[test]
    fn test_tag_facets_counts_and_order() {
        let items = vec![
            tagged("1", "", "", &["b", "a"]),
            tagged("2", "", "", &["a", "a"]),
            tagged("3", "", "", &["c"]),
        ];
        let facets = tag_facets(&items);
        assert_eq!(
            facets,
            vec![
                TagFacet { tag: "a".into(), count: 2 },
                TagFacet { tag: "b".into(), count: 1 },
                TagFacet { tag: "c".into(), count: 1 },
            ]
        );
    }
}
