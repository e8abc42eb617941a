//! Meta-tag extraction from item pages.
//!
//! Items declare their metadata in the page head:
//!
//! ```html
//! <meta name="post-date" content="2025-03-14">
//! <meta content="rust, tokio" name="post-tags">
//! ```
//!
//! Attribute order does not matter, names are matched case-insensitively,
//! and the first occurrence of a name wins. Other attributes on the tag are
//! ignored, including ones that merely end in `name` or `content`, and a `>`
//! inside a quoted value does not end the tag.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static META_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<meta\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap());

// Attribute names must follow whitespace so `data-name=` is not `name=`.
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)(?:^|\s)(name|content)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Lower-cased meta name → trimmed, entity-decoded content.
pub type MetaTags = HashMap<String, String>;

pub fn extract_meta(html: &str) -> MetaTags {
    let mut tags = MetaTags::new();

    for tag in META_TAG.find_iter(html) {
        let mut name: Option<String> = None;
        let mut content: Option<String> = None;

        for cap in ATTRIBUTE.captures_iter(tag.as_str()) {
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match cap[1].to_ascii_lowercase().as_str() {
                "name" if name.is_none() => name = Some(value.trim().to_ascii_lowercase()),
                "content" if content.is_none() => content = Some(decode_entities(value.trim())),
                _ => {}
            }
        }

        if let (Some(name), Some(content)) = (name, content) {
            tags.entry(name).or_insert(content);
        }
    }

    tags
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Look up the first non-empty value among `names`.
pub fn first_of<'a>(tags: &'a MetaTags, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|n| tags.get(*n))
        .map(|v| v.as_str())
        .find(|v| !v.is_empty())
}
