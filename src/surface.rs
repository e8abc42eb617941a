//! Surfaces: where a rendered [`View`] ends up.
//!
//! The controller redraws its surface after every state mutation. A
//! surface only reads the view; it never touches the retrieval state.

use std::io::Write;

use postindex_core::pagination::PageMarker;
use postindex_core::render::{View, ViewStatus};

pub trait Surface: Send {
    fn draw(&mut self, view: &View);
}

/// Plain-text listing on stdout.
pub struct TerminalSurface {
    /// Skip the intermediate `Loading` frames.
    pub settled_only: bool,
}

impl Surface for TerminalSurface {
    fn draw(&mut self, view: &View) {
        if self.settled_only && view.status == ViewStatus::Loading {
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(format_view(view).as_bytes());
        let _ = out.flush();
    }
}

/// One JSON object per frame on stdout.
pub struct JsonSurface {
    pub settled_only: bool,
}

impl Surface for JsonSurface {
    fn draw(&mut self, view: &View) {
        if self.settled_only && view.status == ViewStatus::Loading {
            return;
        }
        if let Ok(line) = serde_json::to_string(view) {
            println!("{}", line);
        }
    }
}

/// Text rendering of a view, as printed by [`TerminalSurface`].
pub fn format_view(view: &View) -> String {
    let mut s = String::new();

    match view.status {
        ViewStatus::Idle => s.push_str("(idle)\n"),
        ViewStatus::Loading => s.push_str("Loading...\n"),
        ViewStatus::Error => {
            s.push_str(&format!(
                "Error: {}\n",
                view.error.as_deref().unwrap_or("unknown")
            ));
        }
        ViewStatus::NoResults => s.push_str("No results.\n"),
        ViewStatus::Ready => {}
    }

    if !view.search_query.trim().is_empty() || view.active_tag.is_some() {
        s.push_str(&format!(
            "Filter: query={:?} tag={}\n",
            view.search_query,
            view.active_tag.as_deref().unwrap_or("-")
        ));
    }

    for (i, record) in view.records.iter().enumerate() {
        s.push_str(&format!("{}. {}  {}\n", i + 1, record.date, record.title));
        s.push_str(&format!("    url: {}\n", record.url));
        if !record.tags.is_empty() {
            s.push_str(&format!("    tags: {}\n", record.tags.join(", ")));
        }
        if !record.summary.is_empty() {
            s.push_str(&format!("    {}\n", record.summary));
        }
    }

    if !view.pagination.is_empty() {
        let mut line = String::new();
        line.push_str(if view.has_previous { "«" } else { " " });
        for marker in &view.pagination {
            match marker {
                PageMarker::Page(p) if *p == view.current_page => {
                    line.push_str(&format!(" [{}]", p))
                }
                other => line.push_str(&format!(" {}", other)),
            }
        }
        line.push(' ');
        line.push_str(if view.has_next { "»" } else { " " });
        s.push_str(line.trim_end());
        s.push('\n');
    } else if let Some(total) = view.total_pages {
        s.push_str(&format!("Loaded {} of {} pages\n", view.current_page, total));
    }

    if !view.tags.is_empty() {
        let tags: Vec<String> = view
            .tags
            .iter()
            .map(|f| {
                if view.active_tag.as_deref() == Some(f.tag.as_str()) {
                    format!("*{}({})", f.tag, f.count)
                } else {
                    format!("{}({})", f.tag, f.count)
                }
            })
            .collect();
        s.push_str(&format!("Tags: {}\n", tags.join(" ")));
    }

    s
}
