//! `sitemap.xml` generation.
//!
//! Static pages from `[sitemap]` come first, then one entry per indexed item
//! in newest-first order. An item's `lastmod` is its `updated` date when it
//! has one, otherwise its publication date.

use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use postindex_core::Item;

use crate::config::Config;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const ITEM_CHANGEFREQ: &str = "monthly";
const ITEM_PRIORITY: &str = "0.7";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: String,
    pub priority: String,
}

pub fn sitemap_entries(config: &Config, items: &[Item]) -> Vec<SitemapEntry> {
    let origin = config.site.origin();

    let statics = config.sitemap.static_pages.iter().map(|page| SitemapEntry {
        loc: format!("{}{}", origin, page.path),
        lastmod: page.lastmod.clone(),
        changefreq: page.changefreq.clone(),
        priority: page.priority.clone(),
    });

    let posts = items.iter().map(|item| SitemapEntry {
        loc: format!("{}{}", origin, item.url),
        lastmod: item.last_modified().format("%Y-%m-%d").to_string(),
        changefreq: ITEM_CHANGEFREQ.to_string(),
        priority: ITEM_PRIORITY.to_string(),
    });

    statics.chain(posts).collect()
}

pub fn render_sitemap(entries: &[SitemapEntry]) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
    ))?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        text_element(&mut writer, "loc", &entry.loc)?;
        text_element(&mut writer, "lastmod", &entry.lastmod)?;
        text_element(&mut writer, "changefreq", &entry.changefreq)?;
        text_element(&mut writer, "priority", &entry.priority)?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// `<name>text</name>` with the text escaped.
pub(crate) fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
