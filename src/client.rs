//! Retrieval controller: drives [`RetrievalState`] against a [`ShardSource`].
//!
//! The controller owns the session state exclusively. Every operation takes
//! `&self`, so the event loop, a scroll handler, and a search box can share
//! one controller; the state's load guard, not the borrow checker, decides
//! which fetch goes out. A second load issued while one is in flight is
//! dropped and reported as [`SkipReason::Busy`].
//!
//! Each fetch is bounded by `fetch_timeout`. After every state mutation the
//! attached [`Surface`] is redrawn from a fresh [`View`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use postindex_core::render::{render_state, View};
use postindex_core::source::{fetch_shard, fetch_summary, ShardLayout, ShardSource};
use postindex_core::state::{LoadOutcome, LoadTarget, LoadTicket, SkipReason};
use postindex_core::{FetchError, LoadMode, RetrievalState};

use crate::surface::Surface;

pub struct RetrievalController {
    source: Arc<dyn ShardSource>,
    layout: ShardLayout,
    state: Mutex<RetrievalState>,
    fetch_timeout: Duration,
    max_visible_pages: u32,
    surface: Mutex<Option<Box<dyn Surface>>>,
}

impl RetrievalController {
    pub fn new(
        source: Arc<dyn ShardSource>,
        layout: ShardLayout,
        mode: LoadMode,
        fetch_timeout: Duration,
        max_visible_pages: u32,
    ) -> Self {
        Self {
            source,
            layout,
            state: Mutex::new(RetrievalState::new(mode)),
            fetch_timeout,
            max_visible_pages,
            surface: Mutex::new(None),
        }
    }

    /// Attach the surface that is redrawn after every mutation.
    pub fn with_surface(self, surface: Box<dyn Surface>) -> Self {
        *self.surface.lock().unwrap() = Some(surface);
        self
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> RetrievalState {
        self.state.lock().unwrap().clone()
    }

    pub fn mode(&self) -> LoadMode {
        self.state.lock().unwrap().mode()
    }

    pub fn view(&self) -> View {
        render_state(&self.state.lock().unwrap(), self.max_visible_pages)
    }

    fn redraw(&self) {
        let view = self.view();
        if let Some(surface) = self.surface.lock().unwrap().as_mut() {
            surface.draw(&view);
        }
    }

    async fn bounded<T, F>(&self, resource: String, fetch: F) -> Result<T, FetchError>
    where
        F: std::future::Future<Output = Result<T, FetchError>>,
    {
        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                resource,
                after_ms: self.fetch_timeout.as_millis() as u64,
            }),
        }
    }

    /// Fetch the summary, then page 1 if the index is not empty.
    pub async fn initialize(&self) -> LoadOutcome {
        let ticket = match self.state.lock().unwrap().begin_initialize() {
            Ok(ticket) => ticket,
            Err(reason) => return LoadOutcome::Skipped(reason),
        };
        self.redraw();

        match self.run_load(ticket).await {
            LoadOutcome::Initialized { total_pages, .. } if total_pages > 0 => {
                self.load_page(1).await
            }
            other => other,
        }
    }

    /// Take the load guard for shard `page`. The fetch itself is
    /// [`run_load`](Self::run_load).
    pub fn begin_page(&self, page: u32) -> Result<LoadTicket, SkipReason> {
        let ticket = self.state.lock().unwrap().begin_load(page);
        match &ticket {
            Ok(_) => self.redraw(),
            Err(reason) => debug!(page, ?reason, "load skipped"),
        }
        ticket
    }

    pub fn begin_next_page(&self) -> Result<LoadTicket, SkipReason> {
        let ticket = self.state.lock().unwrap().begin_next_page();
        match &ticket {
            Ok(_) => self.redraw(),
            Err(reason) => debug!(?reason, "next page skipped"),
        }
        ticket
    }

    pub fn begin_previous_page(&self) -> Result<LoadTicket, SkipReason> {
        let current = self.state.lock().unwrap().current_page();
        self.begin_page(current.saturating_sub(1))
    }

    /// Fetch what `ticket` targets and apply the result.
    pub async fn run_load(&self, ticket: LoadTicket) -> LoadOutcome {
        let outcome = match ticket.target() {
            LoadTarget::Summary => {
                let result = self
                    .bounded(
                        self.layout.summary_file.clone(),
                        fetch_summary(self.source.as_ref(), &self.layout),
                    )
                    .await;
                let mut state = self.state.lock().unwrap();
                match result {
                    Ok(summary) => state.complete_initialize(ticket, summary),
                    Err(e) => {
                        warn!(source = %self.source.describe(), error = %e, "summary fetch failed");
                        state.fail_load(ticket, e)
                    }
                }
            }
            LoadTarget::Page(page) => {
                debug!(page, source = %self.source.describe(), "fetching shard");
                let result = self
                    .bounded(
                        self.layout.shard_file(page),
                        fetch_shard(self.source.as_ref(), &self.layout, page),
                    )
                    .await;
                let mut state = self.state.lock().unwrap();
                match result {
                    Ok(shard) => state.complete_load(ticket, shard),
                    Err(e) => {
                        warn!(page, error = %e, "shard fetch failed");
                        state.fail_load(ticket, e)
                    }
                }
            }
        };
        if outcome == LoadOutcome::Discarded {
            debug!("late response discarded");
        }
        self.redraw();
        outcome
    }

    /// Fetch shard `page` and apply it per the current mode.
    pub async fn load_page(&self, page: u32) -> LoadOutcome {
        match self.begin_page(page) {
            Ok(ticket) => self.run_load(ticket).await,
            Err(reason) => LoadOutcome::Skipped(reason),
        }
    }

    /// `load_page(current_page + 1)`; skipped at the last page.
    pub async fn load_next_page(&self) -> LoadOutcome {
        match self.begin_next_page() {
            Ok(ticket) => self.run_load(ticket).await,
            Err(reason) => LoadOutcome::Skipped(reason),
        }
    }

    /// `load_page(current_page - 1)`.
    pub async fn load_previous_page(&self) -> LoadOutcome {
        match self.begin_previous_page() {
            Ok(ticket) => self.run_load(ticket).await,
            Err(reason) => LoadOutcome::Skipped(reason),
        }
    }

    pub fn set_search_query(&self, query: &str) {
        self.state.lock().unwrap().set_search_query(query);
        self.redraw();
    }

    pub fn toggle_tag(&self, tag: &str) {
        self.state.lock().unwrap().toggle_tag(tag);
        self.redraw();
    }

    /// Drop the query and the active tag.
    pub fn clear_filter(&self) {
        self.state.lock().unwrap().clear_filter();
        self.redraw();
    }

    /// Drop loaded items and invalidate any in-flight fetch.
    pub fn reset(&self) {
        self.state.lock().unwrap().reset();
        self.redraw();
    }

    pub fn set_mode(&self, mode: LoadMode) {
        self.state.lock().unwrap().set_mode(mode);
        self.redraw();
    }
}
