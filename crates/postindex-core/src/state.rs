//! Retrieval state machine.
//!
//! [`RetrievalState`] is the client's session state: pagination position,
//! the loaded item cache, the load guard, and the filter. It performs no
//! I/O. A driver (the application's controller) asks for a [`LoadTicket`]
//! with [`RetrievalState::begin_load`], performs the fetch, and hands the
//! result back with [`RetrievalState::complete_load`] or
//! [`RetrievalState::fail_load`].
//!
//! # Load guard
//!
//! Only one ticket can be outstanding. `begin_load` while a ticket is out
//! returns [`SkipReason::Busy`]: the request is dropped, not queued.
//!
//! # Modes
//!
//! - [`LoadMode::Paged`]: a completed load replaces `loaded_items`.
//! - [`LoadMode::InfiniteScroll`]: a load is only issued for
//!   `current_page + 1` and its items are appended.
//!
//! # Late responses
//!
//! Every ticket carries the epoch it was issued in. [`RetrievalState::reset`]
//! bumps the epoch, and a completion or failure from an older epoch is
//! discarded without touching the item cache. Filter changes leave the epoch
//! alone: the filter is a projection over `loaded_items`, so a late shard
//! appended in infinite-scroll mode simply passes through the current filter.

use crate::error::FetchError;
use crate::filter::{tag_facets, Filter, TagFacet};
use crate::models::{IndexSummary, Item, Shard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    #[default]
    Paged,
    InfiniteScroll,
}

impl LoadMode {
    pub fn from_infinite(enabled: bool) -> Self {
        if enabled {
            LoadMode::InfiniteScroll
        } else {
            LoadMode::Paged
        }
    }
}

/// What an outstanding fetch is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Summary,
    Page(u32),
}

/// Proof that the load guard is held. Returned by `begin_*`, consumed by
/// `complete_*` / `fail_load`.
#[derive(Debug, PartialEq, Eq)]
pub struct LoadTicket {
    target: LoadTarget,
    epoch: u64,
}

impl LoadTicket {
    pub fn target(&self) -> LoadTarget {
        self.target
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Why a load request was not issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is in flight.
    Busy,
    /// The page is outside `[1, total_pages]`.
    OutOfRange { page: u32, total_pages: u32 },
    /// Infinite-scroll mode only accepts the next contiguous page.
    NotContiguous { requested: u32, current: u32 },
    /// `load_next_page` at the last page.
    AtLastPage,
}

/// Result of a load operation as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Shard `page` was applied; `items` is how many it carried.
    Loaded { page: u32, items: usize },
    /// The summary was applied.
    Initialized { total_pages: u32, total_items: u32 },
    /// Nothing was fetched.
    Skipped(SkipReason),
    /// The fetch failed; state is unchanged apart from the error signal.
    Failed(FetchError),
    /// The response arrived after a reset and was dropped.
    Discarded,
}

#[derive(Debug, Clone, Default)]
pub struct RetrievalState {
    mode: LoadMode,
    current_page: u32,
    total_pages: Option<u32>,
    total_items: Option<u32>,
    per_page: Option<u32>,
    loaded_items: Vec<Item>,
    is_loading: bool,
    filter: Filter,
    last_error: Option<FetchError>,
    epoch: u64,
    settled: bool,
}

impl RetrievalState {
    pub fn new(mode: LoadMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    /// Last page applied; 0 before the first load.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Known once the summary or any shard has been applied.
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn total_items(&self) -> Option<u32> {
        self.total_items
    }

    pub fn per_page(&self) -> Option<u32> {
        self.per_page
    }

    pub fn loaded_items(&self) -> &[Item] {
        &self.loaded_items
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn search_query(&self) -> &str {
        &self.filter.query
    }

    pub fn active_tag(&self) -> Option<&str> {
        self.filter.tag.as_deref()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True once a summary or shard has been applied, i.e. the item cache
    /// reflects something the server said rather than the initial void.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Page `load_next_page` would request, if any.
    pub fn next_page(&self) -> Option<u32> {
        match self.total_pages {
            Some(total) if self.current_page >= total => None,
            _ => Some(self.current_page + 1),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.settled && self.next_page().is_some()
    }

    pub fn begin_initialize(&mut self) -> Result<LoadTicket, SkipReason> {
        if self.is_loading {
            return Err(SkipReason::Busy);
        }
        self.is_loading = true;
        Ok(LoadTicket {
            target: LoadTarget::Summary,
            epoch: self.epoch,
        })
    }

    pub fn complete_initialize(&mut self, ticket: LoadTicket, summary: IndexSummary) -> LoadOutcome {
        self.is_loading = false;
        if ticket.epoch != self.epoch {
            return LoadOutcome::Discarded;
        }
        self.total_pages = Some(summary.total_pages);
        self.total_items = Some(summary.total_posts);
        self.per_page = Some(summary.per_page);
        self.last_error = None;
        if summary.total_pages == 0 {
            // Nothing to fetch: an empty index is a settled, empty result.
            self.loaded_items.clear();
            self.current_page = 0;
            self.settled = true;
        }
        LoadOutcome::Initialized {
            total_pages: summary.total_pages,
            total_items: summary.total_posts,
        }
    }

    /// Take the load guard for shard `page`, or say why not.
    pub fn begin_load(&mut self, page: u32) -> Result<LoadTicket, SkipReason> {
        if self.is_loading {
            return Err(SkipReason::Busy);
        }
        let total_pages = self.total_pages.unwrap_or(u32::MAX);
        if page == 0 || page > total_pages {
            return Err(SkipReason::OutOfRange { page, total_pages });
        }
        if self.mode == LoadMode::InfiniteScroll && page != self.current_page + 1 {
            return Err(SkipReason::NotContiguous {
                requested: page,
                current: self.current_page,
            });
        }
        self.is_loading = true;
        Ok(LoadTicket {
            target: LoadTarget::Page(page),
            epoch: self.epoch,
        })
    }

    pub fn begin_next_page(&mut self) -> Result<LoadTicket, SkipReason> {
        if self.is_loading {
            return Err(SkipReason::Busy);
        }
        match self.next_page() {
            Some(page) => self.begin_load(page),
            None => Err(SkipReason::AtLastPage),
        }
    }

    /// Apply a fetched shard. The shard must already be validated against
    /// the ticket's page (see [`crate::shard::decode_shard`]).
    pub fn complete_load(&mut self, ticket: LoadTicket, shard: Shard) -> LoadOutcome {
        self.is_loading = false;
        let page = match ticket.target {
            LoadTarget::Page(page) if ticket.epoch == self.epoch && shard.page == page => page,
            _ => return LoadOutcome::Discarded,
        };

        let count = shard.posts.len();
        match self.mode {
            LoadMode::Paged => {
                self.loaded_items = shard.posts;
            }
            LoadMode::InfiniteScroll => {
                if page != self.current_page + 1 {
                    return LoadOutcome::Discarded;
                }
                self.loaded_items.extend(shard.posts);
            }
        }

        self.current_page = page;
        self.total_pages = Some(shard.total_pages);
        self.total_items = Some(shard.total_posts);
        self.per_page = Some(shard.per_page);
        self.last_error = None;
        self.settled = true;

        LoadOutcome::Loaded { page, items: count }
    }

    /// Release the guard after a failed fetch and record the error.
    pub fn fail_load(&mut self, ticket: LoadTicket, error: FetchError) -> LoadOutcome {
        self.is_loading = false;
        if ticket.epoch != self.epoch {
            return LoadOutcome::Discarded;
        }
        self.last_error = Some(error.clone());
        LoadOutcome::Failed(error)
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.filter.query = query.to_string();
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        self.filter.toggle_tag(tag);
    }

    pub fn clear_filter(&mut self) {
        self.filter = Filter::default();
    }

    /// Loaded items passing the current filter.
    pub fn visible_items(&self) -> Vec<&Item> {
        self.filter.apply(&self.loaded_items)
    }

    /// Tag facets over everything loaded so far.
    pub fn tag_facets(&self) -> Vec<TagFacet> {
        tag_facets(&self.loaded_items)
    }

    /// Drop the item cache and position, keeping totals and the filter.
    /// Any fetch still in flight will be discarded when it resolves.
    pub fn reset(&mut self) {
        self.loaded_items.clear();
        self.current_page = 0;
        self.last_error = None;
        self.settled = self.total_pages == Some(0);
        self.epoch += 1;
    }

    pub fn set_mode(&mut self, mode: LoadMode) {
        if self.mode != mode {
            self.mode = mode;
            self.reset();
        }
    }
}
