//! Page-marker computation for pagination controls.
//!
//! A sliding window centred on the current page, clamped to
//! `[1, total_pages]`. When the window does not reach the first or last
//! page, that page is still shown and an ellipsis marks the collapsed range.
//! The boundary page and its ellipsis use window slots, so with
//! `max_visible >= 5` the number of markers never exceeds `max_visible`.
//!
//! ```text
//! current=1,  total=10, max=5  →  1 2 3 … 10
//! current=5,  total=10, max=5  →  1 … 5 … 10
//! current=10, total=10, max=5  →  1 … 8 9 10
//! ```

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum PageMarker {
    Page(u32),
    Ellipsis,
}

impl std::fmt::Display for PageMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageMarker::Page(n) => write!(f, "{}", n),
            PageMarker::Ellipsis => write!(f, "..."),
        }
    }
}

/// Markers for `current` out of `total` pages with at most `max_visible` slots.
///
/// `current` is clamped into range first, so the result never names a page
/// outside `[1, total]`.
pub fn pagination_window(current: u32, total: u32, max_visible: u32) -> Vec<PageMarker> {
    if total == 0 || max_visible == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total);

    if total <= max_visible {
        return (1..=total).map(PageMarker::Page).collect();
    }

    if max_visible < 5 {
        return narrow_window(current, total, max_visible);
    }

    // Pages shown when the window is anchored to one end, including that end.
    let side = max_visible - 2;
    let mut markers = Vec::with_capacity(max_visible as usize);

    if current <= side {
        markers.extend((1..=side).map(PageMarker::Page));
        markers.push(PageMarker::Ellipsis);
        markers.push(PageMarker::Page(total));
    } else if current > total - side {
        markers.push(PageMarker::Page(1));
        markers.push(PageMarker::Ellipsis);
        markers.extend((total - side + 1..=total).map(PageMarker::Page));
    } else {
        let inner = max_visible - 4;
        let start = current - (inner - 1) / 2;
        markers.push(PageMarker::Page(1));
        markers.push(PageMarker::Ellipsis);
        markers.extend((start..start + inner).map(PageMarker::Page));
        markers.push(PageMarker::Ellipsis);
        markers.push(PageMarker::Page(total));
    }

    markers
}

// Too few slots to pin both ends: plain clamped window with ellipses at the
// collapsed sides.
fn narrow_window(current: u32, total: u32, max_visible: u32) -> Vec<PageMarker> {
    let half = (max_visible - 1) / 2;
    let start = current.saturating_sub(half).max(1).min(total - max_visible + 1);
    let end = start + max_visible - 1;

    let mut markers = Vec::with_capacity(max_visible as usize + 2);
    if start > 1 {
        markers.push(PageMarker::Ellipsis);
    }
    markers.extend((start..=end).map(PageMarker::Page));
    if end < total {
        markers.push(PageMarker::Ellipsis);
    }
    markers
}
