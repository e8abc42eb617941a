//! RSS 2.0 feed generation.
//!
//! The feed carries the most recent `output.feed_limit` items. The channel's
//! `lastBuildDate` is the newest item's date rather than the wall clock, so
//! rebuilding unchanged content yields a byte-identical feed.

use anyhow::Result;
use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use postindex_core::Item;

use crate::config::Config;
use crate::sitemap::text_element;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedChannel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub last_build_date: Option<String>,
    pub self_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub guid: String,
    pub pub_date: String,
    pub description: String,
    pub categories: Vec<String>,
}

/// RFC 822 date at midnight GMT, e.g. `Fri, 14 Mar 2025 00:00:00 GMT`.
pub fn rfc822_date(date: NaiveDate) -> String {
    date.format("%a, %d %b %Y 00:00:00 GMT").to_string()
}

pub fn feed_channel(config: &Config, items: &[Item]) -> FeedChannel {
    let origin = config.site.origin();
    FeedChannel {
        title: config.site.name.clone(),
        link: origin.to_string(),
        description: config.site.description.clone(),
        language: config.site.language.clone(),
        last_build_date: items.first().map(|item| rfc822_date(item.date)),
        self_link: format!("{}/{}", origin, config.output.feed_file),
    }
}

/// Entries for the newest `limit` items. `items` must be sorted newest-first.
pub fn feed_entries(config: &Config, items: &[Item], limit: usize) -> Vec<FeedEntry> {
    let origin = config.site.origin();
    items
        .iter()
        .take(limit)
        .map(|item| {
            let link = format!("{}{}", origin, item.url);
            FeedEntry {
                title: item.title.clone(),
                guid: link.clone(),
                link,
                pub_date: rfc822_date(item.date),
                description: item.summary.clone(),
                categories: item.tags.clone(),
            }
        })
        .collect()
}

pub fn render_feed(channel: &FeedChannel, entries: &[FeedEntry]) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("rss").with_attributes([("version", "2.0"), ("xmlns:atom", ATOM_NS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", &channel.title)?;
    text_element(&mut writer, "link", &channel.link)?;
    text_element(&mut writer, "description", &channel.description)?;
    text_element(&mut writer, "language", &channel.language)?;
    if let Some(date) = &channel.last_build_date {
        text_element(&mut writer, "lastBuildDate", date)?;
    }
    writer.write_event(Event::Empty(BytesStart::new("atom:link").with_attributes([
        ("href", channel.self_link.as_str()),
        ("rel", "self"),
        ("type", "application/rss+xml"),
    ])))?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &entry.title)?;
        text_element(&mut writer, "link", &entry.link)?;
        text_element(&mut writer, "guid", &entry.guid)?;
        text_element(&mut writer, "pubDate", &entry.pub_date)?;
        text_element(&mut writer, "description", &entry.description)?;
        for category in &entry.categories {
            text_element(&mut writer, "category", category)?;
        }
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<Item> {
        let base = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        (0..n)
            .map(|i| Item {
                slug: format!("p{}", i),
                url: Item::url_for(&format!("p{}", i)),
                title: format!("Post <{}>", i),
                date: base - chrono::Days::new(i as u64),
                updated: None,
                summary: "s".to_string(),
                thumbnail: None,
                tags: vec!["llm".to_string(), "bench".to_string()],
            })
            .collect()
    }

    #[test]
    fn test_rfc822() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(rfc822_date(date), "Fri, 14 Mar 2025 00:00:00 GMT");
    }

    #[test]
    fn test_entries_capped_at_limit() {
        let config = Config::minimal();
        let entries = feed_entries(&config, &items(60), 50);
        assert_eq!(entries.len(), 50);
        assert_eq!(entries[0].link, "http://localhost/posts/p0/");
        assert_eq!(entries[0].guid, entries[0].link);
        assert_eq!(entries[49].title, "Post <49>");
    }

    #[test]
    fn test_channel_build_date_is_newest_item() {
        let config = Config::minimal();
        let channel = feed_channel(&config, &items(3));
        assert_eq!(
            channel.last_build_date.as_deref(),
            Some("Fri, 14 Mar 2025 00:00:00 GMT")
        );
        assert_eq!(channel.self_link, "http://localhost/rss.xml");
        assert!(feed_channel(&config, &[]).last_build_date.is_none());
    }

    #[test]
    fn test_render_feed() {
        let config = Config::minimal();
        let items = items(2);
        let xml = render_feed(
            &feed_channel(&config, &items),
            &feed_entries(&config, &items, 50),
        )
        .unwrap();
        let xml = String::from_utf8(xml).unwrap();

        assert!(xml.contains("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">"));
        assert!(xml.contains("<title>Post &lt;0&gt;</title>"));
        assert!(xml.contains("<pubDate>Thu, 13 Mar 2025 00:00:00 GMT</pubDate>"));
        assert!(xml.contains("<category>bench</category>"));
        assert!(xml.contains("rel=\"self\""));
        assert_eq!(xml.matches("<item>").count(), 2);
    }
}
