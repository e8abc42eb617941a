//! TOML configuration.
//!
//! ```toml
//! [site]
//! url = "https://example.com"
//! name = "example"
//! description = "Daily notes"
//!
//! [content]
//! root = "posts"
//!
//! [output]
//! dir = "."
//! per_page = 20
//!
//! [[sitemap.static_pages]]
//! path = "/"
//! lastmod = "2025-01-01"
//! changefreq = "daily"
//! priority = "1.0"
//!
//! [client]
//! base_url = "https://example.com"
//! infinite_scroll_enabled = false
//! ```
//!
//! Every section except `[site]` may be omitted.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use postindex_core::source::{ShardLayout, DEFAULT_SHARD_PREFIX, DEFAULT_SUMMARY_FILE};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Origin prepended to every item url, e.g. `https://example.com`.
    pub url: String,
    #[serde(default = "default_site_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_site_name() -> String {
    "posts".to_string()
}
fn default_language() -> String {
    "en-us".to_string()
}

impl SiteConfig {
    /// Site url without a trailing slash.
    pub fn origin(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Directory holding one sub-directory per item.
    #[serde(default = "default_content_root")]
    pub root: PathBuf,
    /// File inside each item directory carrying the meta tags.
    #[serde(default = "default_index_file")]
    pub index_file: String,
    /// Globs over item directory names; empty means all.
    #[serde(default)]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_content_root(),
            index_file: default_index_file(),
            include_globs: Vec::new(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_content_root() -> PathBuf {
    PathBuf::from("posts")
}
fn default_index_file() -> String {
    "index.html".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_shard_prefix")]
    pub shard_prefix: String,
    #[serde(default = "default_summary_file")]
    pub summary_file: String,
    #[serde(default = "default_sitemap_file")]
    pub sitemap_file: String,
    #[serde(default = "default_feed_file")]
    pub feed_file: String,
    /// Most recent items carried by the feed.
    #[serde(default = "default_feed_limit")]
    pub feed_limit: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            per_page: default_per_page(),
            shard_prefix: default_shard_prefix(),
            summary_file: default_summary_file(),
            sitemap_file: default_sitemap_file(),
            feed_file: default_feed_file(),
            feed_limit: default_feed_limit(),
        }
    }
}

impl OutputConfig {
    pub fn layout(&self) -> ShardLayout {
        ShardLayout {
            shard_prefix: self.shard_prefix.clone(),
            summary_file: self.summary_file.clone(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_per_page() -> u32 {
    20
}
fn default_shard_prefix() -> String {
    DEFAULT_SHARD_PREFIX.to_string()
}
fn default_summary_file() -> String {
    DEFAULT_SUMMARY_FILE.to_string()
}
fn default_sitemap_file() -> String {
    "sitemap.xml".to_string()
}
fn default_feed_file() -> String {
    "rss.xml".to_string()
}
fn default_feed_limit() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SitemapConfig {
    /// Non-item pages listed before the items.
    #[serde(default)]
    pub static_pages: Vec<StaticPage>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StaticPage {
    pub path: String,
    pub lastmod: String,
    #[serde(default = "default_changefreq")]
    pub changefreq: String,
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_changefreq() -> String {
    "monthly".to_string()
}
fn default_priority() -> String {
    "0.5".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Where shards are fetched from: an `http(s)://` url or a directory.
    /// Defaults to `[output].dir`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_visible_pages")]
    pub max_visible_pages: u32,
    #[serde(default)]
    pub infinite_scroll_enabled: bool,
    #[serde(default = "default_lazy_load_threshold_px")]
    pub lazy_load_threshold_px: u32,
    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub scroll_debounce_ms: u64,
    /// Minimum gap between two scroll-triggered page loads.
    #[serde(default = "default_scroll_load_interval_ms")]
    pub scroll_load_interval_ms: u64,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            max_visible_pages: default_max_visible_pages(),
            infinite_scroll_enabled: false,
            lazy_load_threshold_px: default_lazy_load_threshold_px(),
            search_debounce_ms: default_debounce_ms(),
            scroll_debounce_ms: default_debounce_ms(),
            scroll_load_interval_ms: default_scroll_load_interval_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

fn default_max_visible_pages() -> u32 {
    5
}
fn default_lazy_load_threshold_px() -> u32 {
    200
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_scroll_load_interval_ms() -> u64 {
    1_000
}
fn default_fetch_timeout_ms() -> u64 {
    10_000
}

impl Config {
    /// Defaults for commands that can run without a config file.
    pub fn minimal() -> Self {
        Self {
            site: SiteConfig {
                url: "http://localhost".to_string(),
                name: default_site_name(),
                description: String::new(),
                language: default_language(),
            },
            content: ContentConfig::default(),
            output: OutputConfig::default(),
            sitemap: SitemapConfig::default(),
            client: ClientConfig::default(),
        }
    }

    /// Base location the client reads shards from.
    pub fn client_base(&self) -> String {
        self.client
            .base_url
            .clone()
            .unwrap_or_else(|| self.output.dir.display().to_string())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Relative paths are relative to the config file, not the working directory.
    if let Some(base) = path.parent() {
        if config.content.root.is_relative() {
            config.content.root = base.join(&config.content.root);
        }
        if config.output.dir.is_relative() {
            config.output.dir = base.join(&config.output.dir);
        }
    }

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if !(config.site.url.starts_with("http://") || config.site.url.starts_with("https://")) {
        bail!("site.url must start with http:// or https://");
    }

    if config.output.per_page == 0 {
        bail!("output.per_page must be > 0");
    }
    if config.output.feed_limit == 0 {
        bail!("output.feed_limit must be >= 1");
    }
    if config.output.shard_prefix.is_empty() {
        bail!("output.shard_prefix must not be empty");
    }
    if config.output.summary_file.starts_with(&config.output.shard_prefix) {
        bail!("output.summary_file must not start with output.shard_prefix");
    }

    if config.client.max_visible_pages == 0 {
        bail!("client.max_visible_pages must be >= 1");
    }
    if config.client.fetch_timeout_ms == 0 {
        bail!("client.fetch_timeout_ms must be > 0");
    }

    Ok(())
}
