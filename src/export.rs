//! Serialize a [`BuildOutput`] into the files a static host serves.
//!
//! Produces one JSON file per shard, the summary pointer, `sitemap.xml`
//! and `rss.xml`. Rendering is deterministic: the same build output always
//! yields the same bytes, which is what change detection relies on.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::Config;
use crate::feed::render_feed;
use crate::ingest::BuildOutput;
use crate::sitemap::render_sitemap;

/// A rendered output file, named relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

fn pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Render every output file, shards first.
pub fn render_outputs(config: &Config, output: &BuildOutput) -> Result<Vec<OutputFile>> {
    let layout = config.output.layout();
    let mut files = Vec::with_capacity(output.shards.len() + 3);

    for shard in &output.shards {
        files.push(OutputFile {
            name: layout.shard_file(shard.page),
            bytes: pretty_json(shard)
                .with_context(|| format!("Failed to serialize page {}", shard.page))?,
        });
    }

    files.push(OutputFile {
        name: layout.summary_file.clone(),
        bytes: pretty_json(&output.summary)?,
    });
    files.push(OutputFile {
        name: config.output.sitemap_file.clone(),
        bytes: render_sitemap(&output.sitemap_entries)?,
    });
    files.push(OutputFile {
        name: config.output.feed_file.clone(),
        bytes: render_feed(&output.feed_channel, &output.feed_entries)?,
    });

    Ok(files)
}
