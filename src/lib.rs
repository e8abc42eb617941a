//! # postindex
//!
//! Builds a paginated JSON index of a static blog's posts, plus the sitemap
//! and RSS feed, and reads the index back the way the site's listing page
//! does.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────────┐
//! │ posts/*/    │──▶│   Builder    │──▶│ shards,summary │
//! │ index.html  │   │ extract+sort │   │ sitemap, rss   │
//! └─────────────┘   └──────────────┘   └───────┬────────┘
//!                                              │ fs / http
//!                                              ▼
//!                   ┌──────────────┐   ┌────────────────┐
//!                   │   Surface    │◀──│  Retrieval     │
//!                   │ text / json  │   │  controller    │
//!                   └──────────────┘   └────────────────┘
//! ```
//!
//! The item model, partitioning, filtering, pagination window and the
//! retrieval state machine live in `postindex-core`, which has no runtime
//! or I/O dependencies.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Builder-side types: raw source items, skip reasons |
//! | [`connector_fs`] | Post directory scanner |
//! | [`extract`] | `<meta>` tag extraction |
//! | [`ingest`] | Build pipeline |
//! | [`export`] | Output file rendering |
//! | [`sitemap`] | `sitemap.xml` |
//! | [`feed`] | RSS 2.0 feed |
//! | [`output`] | Change detection and atomic writes |
//! | [`progress`] | Build progress reporting |
//! | [`fetch`] | HTTP and filesystem shard sources |
//! | [`client`] | Retrieval controller |
//! | [`session`] | Debounced event loop |
//! | [`surface`] | View output |
//! | [`browse`] | `browse` and `session` commands |
//! | [`stats`] | Index verification |

pub mod browse;
pub mod client;
pub mod config;
pub mod connector_fs;
pub mod export;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod output;
pub mod progress;
pub mod session;
pub mod sitemap;
pub mod stats;
pub mod surface;
