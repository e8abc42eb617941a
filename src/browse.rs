//! `postindex browse` and `postindex session`: the retrieval engine on a
//! terminal.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use postindex_core::render::ViewStatus;
use postindex_core::state::LoadOutcome;
use postindex_core::LoadMode;

use crate::client::RetrievalController;
use crate::config::Config;
use crate::fetch::open_source;
use crate::session::{parse_command, run_session, SessionOptions};
use crate::surface::{format_view, JsonSurface, Surface, TerminalSurface};

/// Options for a one-shot `browse`.
#[derive(Debug, Clone, Default)]
pub struct BrowseOptions {
    /// Page to show in paged mode.
    pub page: Option<u32>,
    /// Number of pages to accumulate in infinite-scroll mode.
    pub pages: Option<u32>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub infinite: bool,
    pub json: bool,
}

/// A controller reading from the configured client base.
pub fn controller_from_config(config: &Config, mode: LoadMode) -> Result<RetrievalController> {
    let timeout = Duration::from_millis(config.client.fetch_timeout_ms);
    let source = open_source(&config.client_base(), timeout)?;
    Ok(RetrievalController::new(
        Arc::from(source),
        config.output.layout(),
        mode,
        timeout,
        config.client.max_visible_pages,
    ))
}

fn mode_for(config: &Config, infinite: bool) -> LoadMode {
    LoadMode::from_infinite(infinite || config.client.infinite_scroll_enabled)
}

/// Load, filter, print one view, exit.
pub async fn run_browse(config: &Config, opts: &BrowseOptions) -> Result<()> {
    let mode = mode_for(config, opts.infinite);
    let controller = controller_from_config(config, mode)?;

    let mut outcome = controller.initialize().await;
    match mode {
        LoadMode::Paged => {
            if let Some(page) = opts.page.filter(|p| *p != 1) {
                outcome = controller.load_page(page).await;
            }
        }
        LoadMode::InfiniteScroll => {
            for _ in 1..opts.pages.unwrap_or(1) {
                outcome = controller.load_next_page().await;
                if !matches!(outcome, LoadOutcome::Loaded { .. }) {
                    break;
                }
            }
        }
    }
    if let LoadOutcome::Skipped(reason) = outcome {
        warn!(?reason, "request skipped");
    }

    if let Some(query) = &opts.search {
        controller.set_search_query(query);
    }
    if let Some(tag) = &opts.tag {
        controller.toggle_tag(tag);
    }

    let view = controller.view();
    if opts.json {
        JsonSurface { settled_only: false }.draw(&view);
    } else {
        print!("{}", format_view(&view));
    }

    if view.status == ViewStatus::Error {
        bail!(
            "Retrieval failed: {}",
            view.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    Ok(())
}

/// Interactive session: commands on stdin, a redrawn view on stdout.
pub async fn run_interactive(config: &Config, infinite: bool, json: bool) -> Result<()> {
    let surface: Box<dyn Surface> = if json {
        Box::new(JsonSurface { settled_only: true })
    } else {
        Box::new(TerminalSurface { settled_only: true })
    };
    let controller = controller_from_config(config, mode_for(config, infinite))?.with_surface(surface);

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                None => warn!(command = %line.trim(), "unknown command"),
            }
        }
    });

    controller.initialize().await;
    run_session(&controller, rx, SessionOptions::from_config(&config.client)).await
}
