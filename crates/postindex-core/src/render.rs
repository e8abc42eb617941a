//! Render projection: state in, display records out.
//!
//! [`render`] is pure. Drawing the resulting [`View`] is the job of a
//! surface adapter in the application crate, so everything up to the last
//! pixel is testable without a terminal or browser.

use serde::Serialize;

use crate::filter::TagFacet;
use crate::models::Item;
use crate::pagination::{pagination_window, PageMarker};
use crate::state::{LoadMode, RetrievalState};

/// Exactly one of these describes the view at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    /// Nothing requested yet.
    Idle,
    /// A fetch is in flight. Already loaded records are still listed.
    Loading,
    /// The last fetch failed. Previously loaded records are still listed.
    Error,
    /// Loading finished and the filtered set is empty.
    NoResults,
    Ready,
}

/// One row of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRecord {
    pub slug: String,
    pub title: String,
    pub url: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub summary: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl From<&Item> for DisplayRecord {
    fn from(item: &Item) -> Self {
        Self {
            slug: item.slug.clone(),
            title: item.title.clone(),
            url: item.url.clone(),
            date: item.date.format("%Y-%m-%d").to_string(),
            summary: item.summary.clone(),
            tags: item.tags.clone(),
            thumbnail: item.thumbnail.clone().filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub status: ViewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub records: Vec<DisplayRecord>,
    /// Empty in infinite-scroll mode, which has no page controls.
    pub pagination: Vec<PageMarker>,
    pub current_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    pub has_previous: bool,
    pub has_next: bool,
    pub tags: Vec<TagFacet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_tag: Option<String>,
    pub search_query: String,
}

/// Project the filtered items and the state into a [`View`].
pub fn render(filtered: &[&Item], state: &RetrievalState, max_visible: u32) -> View {
    let status = if state.is_loading() {
        ViewStatus::Loading
    } else if state.last_error().is_some() {
        ViewStatus::Error
    } else if !state.is_settled() {
        ViewStatus::Idle
    } else if filtered.is_empty() {
        ViewStatus::NoResults
    } else {
        ViewStatus::Ready
    };

    let pagination = match (state.mode(), state.total_pages()) {
        (LoadMode::Paged, Some(total)) => {
            pagination_window(state.current_page(), total, max_visible)
        }
        _ => Vec::new(),
    };

    View {
        status,
        error: state.last_error().map(|e| e.to_string()),
        records: filtered.iter().map(|item| DisplayRecord::from(*item)).collect(),
        pagination,
        current_page: state.current_page(),
        total_pages: state.total_pages(),
        // Infinite scroll only ever moves forward.
        has_previous: state.mode() == LoadMode::Paged && state.has_previous(),
        has_next: state.has_next(),
        tags: state.tag_facets(),
        active_tag: state.active_tag().map(str::to_string),
        search_query: state.search_query().to_string(),
    }
}

/// Render straight from the state's own filter.
pub fn render_state(state: &RetrievalState, max_visible: u32) -> View {
    let visible = state.visible_items();
    render(&visible, state, max_visible)
}
