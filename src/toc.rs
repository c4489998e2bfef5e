//! Table-of-contents outline and active-heading tracking.
//!
//! [`build_outline`] derives an ordered outline from a transformed document
//! (heading ids were already assigned by the transform pass). An empty
//! outline means the caller should render no TOC at all.
//!
//! [`OutlineTracker`] keeps the "active" entry against scroll position.
//! Positions arrive through a [`ScrollPort`] supplied by the caller, so the
//! tracker stays deterministic under test: no ambient window state.

use dom_query::Document;

use crate::models::TocEntry;
use crate::transform::HEADING_ID_PREFIX;

/// Headings whose text matches any of these substrings (case-insensitively)
/// are excluded from the outline.
pub const HEADING_DENYLIST: &[&str] = &[
    "reference",
    "see also",
    "external links",
    "further reading",
];

/// Display text longer than this many chars is truncated with an ellipsis.
const MAX_ENTRY_CHARS: usize = 50;

/// A heading's top edge must be at or above this viewport offset to count
/// as active.
pub const ACTIVE_THRESHOLD_PX: f64 = 150.0;

/// True if a heading's trimmed text matches the outline denylist.
pub fn is_denylisted_heading(text: &str) -> bool {
    let lower = text.to_lowercase();
    HEADING_DENYLIST.iter().any(|term| lower.contains(term))
}

fn entry_text(text: &str) -> String {
    if text.chars().count() > MAX_ENTRY_CHARS {
        let truncated: String = text.chars().take(MAX_ENTRY_CHARS).collect();
        format!("{}…", truncated)
    } else {
        text.to_string()
    }
}

/// Build the ordered outline from a transformed document. Only headings that
/// received a `toc-heading-<n>` id during the transform pass are included.
pub fn build_outline(transformed_html: &str) -> Vec<TocEntry> {
    let doc = Document::from(transformed_html);
    let mut entries = Vec::new();

    for heading in doc.select("h2, h3, h4").iter() {
        let id = match heading.attr("id") {
            Some(id) if id.starts_with(HEADING_ID_PREFIX) => id.to_string(),
            _ => continue,
        };
        let text = heading.text();
        let text = text.trim();
        if text.is_empty() || is_denylisted_heading(text) {
            continue;
        }
        let level = if heading.is("h2") {
            2
        } else if heading.is("h3") {
            3
        } else {
            4
        };
        entries.push(TocEntry {
            id,
            text: entry_text(text),
            level,
        });
    }

    entries
}

/// A heading's current vertical position, in viewport coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingPosition {
    pub id: String,
    pub top: f64,
}

/// Supplies current heading positions on demand. Implemented by the view
/// layer over its scroll container; tests use a fixed vector.
pub trait ScrollPort {
    fn heading_positions(&self) -> Vec<HeadingPosition>;
}

/// Tracks which outline entry is active as the reader scrolls.
#[derive(Debug)]
pub struct OutlineTracker {
    entries: Vec<TocEntry>,
    active: Option<String>,
}

impl OutlineTracker {
    pub fn new(entries: Vec<TocEntry>) -> Self {
        Self {
            entries,
            active: None,
        }
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The currently active entry id, if any.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Recompute the active entry from a scroll sample: the last heading in
    /// document order whose top edge is at or above the threshold. If none
    /// qualifies, the previous active entry is kept (no flicker to "none").
    pub fn observe(&mut self, positions: &[HeadingPosition]) -> Option<&str> {
        let mut candidate = None;
        for entry in &self.entries {
            if let Some(pos) = positions.iter().find(|p| p.id == entry.id) {
                if pos.top <= ACTIVE_THRESHOLD_PX {
                    candidate = Some(entry.id.clone());
                }
            }
        }
        if candidate.is_some() {
            self.active = candidate;
        }
        self.active()
    }

    /// Convenience: sample positions from a port and recompute.
    pub fn poll(&mut self, port: &dyn ScrollPort) -> Option<&str> {
        let positions = port.heading_positions();
        self.observe(&positions)
    }

    /// Click path: optimistically mark an entry active ahead of the
    /// scroll-driven recomputation. Returns the id to scroll to, or `None`
    /// for an id not in the outline.
    pub fn activate(&mut self, id: &str) -> Option<String> {
        if self.entries.iter().any(|e| e.id == id) {
            self.active = Some(id.to_string());
            Some(id.to_string())
        } else {
            None
        }
    }
}
