//! Interactive retrieval session.
//!
//! Consumes [`UiEvent`]s from a channel and drives a [`RetrievalController`].
//! Search input is debounced by `search_debounce`; scroll events trigger a
//! next-page load only near the bottom of the content and only after
//! `scroll_debounce` of quiet. Scroll-triggered loads are further throttled
//! to one per `scroll_load_interval`. Tag toggles and explicit page requests
//! apply immediately. A mode switch or reset reloads page 1 once any load
//! already in flight has resolved.
//!
//! A load runs alongside event handling. The load guard is taken when the
//! request is handled, so a page request arriving while a fetch is in
//! flight is dropped by the controller without a second fetch.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use postindex_core::state::{LoadOutcome, LoadTicket};
use postindex_core::timer::{Debouncer, Throttle};
use postindex_core::LoadMode;

use crate::client::RetrievalController;
use crate::config::ClientConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SearchInput(String),
    ToggleTag(String),
    LoadPage(u32),
    NextPage,
    PreviousPage,
    /// Scroll position of the listing, in pixels.
    Scroll {
        scroll_top: u32,
        viewport_height: u32,
        content_height: u32,
    },
    SetMode(LoadMode),
    /// Drop loaded pages and start again from page 1.
    Reset,
    /// Drop the search query and the active tag.
    ClearFilter,
    Quit,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub search_debounce: Duration,
    pub scroll_debounce: Duration,
    pub scroll_load_interval: Duration,
    pub lazy_load_threshold_px: u32,
}

impl SessionOptions {
    pub fn from_config(client: &ClientConfig) -> Self {
        Self {
            search_debounce: Duration::from_millis(client.search_debounce_ms),
            scroll_debounce: Duration::from_millis(client.scroll_debounce_ms),
            scroll_load_interval: Duration::from_millis(client.scroll_load_interval_ms),
            lazy_load_threshold_px: client.lazy_load_threshold_px,
        }
    }
}

/// True when the bottom of the viewport is within `threshold` of the end.
pub fn near_bottom(scroll_top: u32, viewport_height: u32, content_height: u32, threshold: u32) -> bool {
    scroll_top.saturating_add(viewport_height).saturating_add(threshold) >= content_height
}

type LoadFuture<'a> = Pin<Box<dyn Future<Output = LoadOutcome> + 'a>>;

/// Take the load guard for a page request, synchronously.
fn begin_request(controller: &RetrievalController, event: &UiEvent) -> Option<LoadTicket> {
    let ticket = match event {
        UiEvent::LoadPage(page) => controller.begin_page(*page),
        UiEvent::NextPage => controller.begin_next_page(),
        UiEvent::PreviousPage => controller.begin_previous_page(),
        _ => return None,
    };
    ticket.ok()
}

fn to_tokio(deadline: Option<std::time::Instant>) -> Option<Instant> {
    deadline.map(Instant::from_std)
}

fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Run until [`UiEvent::Quit`] or the channel closes.
///
/// A pending search is applied before returning and an in-flight load is
/// awaited.
pub async fn run_session(
    controller: &RetrievalController,
    mut events: mpsc::Receiver<UiEvent>,
    options: SessionOptions,
) -> Result<()> {
    let mut search: Debouncer<String> = Debouncer::new(options.search_debounce);
    let mut scroll: Debouncer<()> = Debouncer::new(options.scroll_debounce);
    let mut scroll_loads = Throttle::new(options.scroll_load_interval);
    let mut in_flight: Option<LoadFuture<'_>> = None;
    let mut reload = false;

    loop {
        if reload && in_flight.is_none() {
            reload = false;
            if let Ok(ticket) = controller.begin_page(1) {
                in_flight = Some(Box::pin(controller.run_load(ticket)));
            }
        }
        let deadline = earliest(to_tokio(search.deadline()), to_tokio(scroll.deadline()));

        tokio::select! {
            outcome = async {
                match in_flight.as_mut() {
                    Some(load) => load.await,
                    None => std::future::pending().await,
                }
            }, if in_flight.is_some() => {
                debug!(?outcome, "load finished");
                in_flight = None;
            }

            _ = async {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending().await,
                }
            }, if deadline.is_some() => {
                let now = Instant::now().into_std();
                if let Some(query) = search.poll(now) {
                    debug!(query = %query, "search applied");
                    controller.set_search_query(&query);
                }
                if scroll.poll(now).is_some() {
                    if !scroll_loads.try_fire(now) {
                        debug!("scroll load throttled");
                        scroll.schedule((), now);
                    } else if let Ok(ticket) = controller.begin_next_page() {
                        in_flight = Some(Box::pin(controller.run_load(ticket)));
                    }
                }
            }

            event = events.recv() => {
                let event = match event {
                    None | Some(UiEvent::Quit) => break,
                    Some(event) => event,
                };
                let now = Instant::now().into_std();
                match &event {
                    UiEvent::SearchInput(query) => search.schedule(query.clone(), now),
                    UiEvent::ToggleTag(tag) => controller.toggle_tag(tag),
                    UiEvent::ClearFilter => {
                        search.cancel();
                        controller.clear_filter();
                    }
                    UiEvent::SetMode(mode) => {
                        if controller.mode() != *mode {
                            controller.set_mode(*mode);
                            scroll.cancel();
                            scroll_loads.reset();
                            reload = true;
                        }
                    }
                    UiEvent::Reset => {
                        controller.reset();
                        scroll.cancel();
                        scroll_loads.reset();
                        reload = true;
                    }
                    UiEvent::Scroll { scroll_top, viewport_height, content_height } => {
                        if controller.mode() == LoadMode::InfiniteScroll
                            && near_bottom(
                                *scroll_top,
                                *viewport_height,
                                *content_height,
                                options.lazy_load_threshold_px,
                            )
                        {
                            scroll.schedule((), now);
                        }
                    }
                    _ => {
                        if let Some(ticket) = begin_request(controller, &event) {
                            in_flight = Some(Box::pin(controller.run_load(ticket)));
                        }
                    }
                }
            }
        }
    }

    if let Some(query) = search.flush() {
        controller.set_search_query(&query);
    }
    if scroll.is_pending() {
        debug!("pending scroll load dropped on exit");
    }
    if let Some(load) = in_flight.take() {
        let outcome = load.await;
        debug!(?outcome, "load finished");
    }
    Ok(())
}

/// Parse one line of the `session` command's stdin protocol.
///
/// ```text
/// next | prev | page <n> | search <text> | tag <name> | clear
/// scroll <top> <viewport> <height> | mode paged|infinite | reset | quit
/// ```
pub fn parse_command(line: &str) -> Option<UiEvent> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };
    match cmd {
        "next" => Some(UiEvent::NextPage),
        "prev" => Some(UiEvent::PreviousPage),
        "page" => rest.parse().ok().map(UiEvent::LoadPage),
        "search" => Some(UiEvent::SearchInput(rest.to_string())),
        "tag" if !rest.is_empty() => Some(UiEvent::ToggleTag(rest.to_string())),
        "clear" => Some(UiEvent::ClearFilter),
        "reset" => Some(UiEvent::Reset),
        "mode" => match rest {
            "paged" => Some(UiEvent::SetMode(LoadMode::Paged)),
            "infinite" => Some(UiEvent::SetMode(LoadMode::InfiniteScroll)),
            _ => None,
        },
        "scroll" => {
            let nums: Vec<u32> = rest
                .split_whitespace()
                .map(str::parse)
                .collect::<std::result::Result<_, _>>()
                .ok()?;
            match nums.as_slice() {
                [top, viewport, height] => Some(UiEvent::Scroll {
                    scroll_top: *top,
                    viewport_height: *viewport,
                    content_height: *height,
                }),
                _ => None,
            }
        }
        "quit" | "exit" => Some(UiEvent::Quit),
        _ => None,
    }
}
