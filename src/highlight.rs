//! Highlight overlay engine: re-injects `<mark>` wrappers for stored
//! highlights into transformed article HTML.
//!
//! The accumulated document is kept as a list of plain and already-marked
//! segments; each highlight's pattern only ever runs against plain segments,
//! so one highlight can never corrupt another marker's attribute text.
//! Highlights are applied longest text first, and a fragment that survives
//! only inside an earlier marker is silently skipped — nesting markers is
//! deliberately not supported.

use dom_query::Document;
use regex::Regex;

use crate::models::Highlight;

/// Class carried by every injected marker element.
pub const MARKER_CLASS: &str = "shelf-highlight";

/// Attribute resolving a rendered marker back to its [`Highlight::id`].
pub const MARKER_ID_ATTR: &str = "data-highlight-id";

enum Segment {
    Plain(String),
    Marker(String),
}

/// Wrap every literal occurrence of each highlight's text, case-insensitively.
/// Identity on an empty highlight set; a highlight whose text is absent from
/// the current content simply inserts nothing.
pub fn apply_highlights(html: &str, highlights: &[Highlight]) -> String {
    if highlights.is_empty() {
        return html.to_string();
    }

    let mut ordered: Vec<&Highlight> = highlights
        .iter()
        .filter(|h| !h.text.trim().is_empty())
        .collect();
    // Longest first, so a substring highlight cannot split a longer match.
    ordered.sort_by(|a, b| b.text.len().cmp(&a.text.len()));

    let mut segments = vec![Segment::Plain(html.to_string())];

    for highlight in ordered {
        let pattern = format!("(?i){}", regex::escape(&highlight.text));
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(_) => continue,
        };
        segments = overlay_one(segments, highlight, &re);
    }

    let mut out = String::with_capacity(html.len());
    for segment in &segments {
        match segment {
            Segment::Plain(text) | Segment::Marker(text) => out.push_str(text),
        }
    }
    out
}

fn overlay_one(segments: Vec<Segment>, highlight: &Highlight, re: &Regex) -> Vec<Segment> {
    let mut next = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Marker(text) => next.push(Segment::Marker(text)),
            Segment::Plain(text) => {
                let mut last = 0;
                for found in re.find_iter(&text) {
                    if found.start() > last {
                        next.push(Segment::Plain(text[last..found.start()].to_string()));
                    }
                    next.push(Segment::Marker(render_marker(highlight, found.as_str())));
                    last = found.end();
                }
                if last < text.len() || last == 0 {
                    next.push(Segment::Plain(text[last..].to_string()));
                }
            }
        }
    }
    next
}

/// Marker wrapping preserves the matched text's original case.
fn render_marker(highlight: &Highlight, matched: &str) -> String {
    format!(
        "<mark class=\"{}\" {}=\"{}\" data-color=\"{}\">{}</mark>",
        MARKER_CLASS,
        MARKER_ID_ATTR,
        escape_attr(&highlight.id),
        escape_attr(&highlight.color),
        matched
    )
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Resolve a clicked marker fragment back to its highlight id. Read path
/// only — deleting the highlight is the collaborator's job.
pub fn marker_highlight_id(fragment: &str) -> Option<String> {
    let doc = Document::from(fragment);
    let marker = doc.select(&format!("mark[{}]", MARKER_ID_ATTR));
    marker.attr(MARKER_ID_ATTR).map(|id| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight(id: &str, text: &str) -> Highlight {
        Highlight {
            id: id.to_string(),
            article_id: "Cat".to_string(),
            text: text.to_string(),
            color: "#ffe28a".to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_empty_set_is_identity() {
        let html = "<p>The quick fox</p>";
        assert_eq!(apply_highlights(html, &[]), html);
    }

    #[test]
    fn test_single_occurrence_wrapped_exactly() {
        let out = apply_highlights("The quick fox", &[highlight("h1", "quick")]);
        assert_eq!(
            out,
            "The <mark class=\"shelf-highlight\" data-highlight-id=\"h1\" \
             data-color=\"#ffe28a\">quick</mark> fox"
        );
    }

    #[test]
    fn test_case_insensitive_preserves_original_case() {
        let out = apply_highlights("Quick fixes are quick.", &[highlight("h1", "quick")]);
        assert!(out.contains(">Quick</mark>"));
        assert!(out.contains(">quick</mark>"));
        assert_eq!(out.matches("<mark").count(), 2);
    }

    #[test]
    fn test_regex_metacharacters_escaped() {
        let out = apply_highlights("Costs $4.50 (roughly)", &[highlight("h1", "$4.50 (roughly)")]);
        assert_eq!(out.matches("<mark").count(), 1);
        assert!(out.contains(">$4.50 (roughly)</mark>"));
    }

    #[test]
    fn test_missing_text_is_silent() {
        let html = "<p>Nothing matches here</p>";
        let out = apply_highlights(html, &[highlight("h1", "absent phrase")]);
        assert_eq!(out, html);
    }

    #[test]
    fn test_second_highlight_does_not_corrupt_marker_attributes() {
        // "mark" appears in the injected wrapper markup itself; a highlight
        // for it must only match the remaining plain text.
        let out = apply_highlights(
            "bookmark the markers",
            &[highlight("h1", "the"), highlight("h2", "mark")],
        );
        assert!(out.contains("data-highlight-id=\"h1\""));
        assert!(out.contains("data-highlight-id=\"h2\""));
        // The h1 marker's own tag name and attributes survived intact.
        assert_eq!(out.matches("</mark>").count(), out.matches("<mark ").count());
    }

    #[test]
    fn test_substring_of_earlier_marker_skipped_inside() {
        // "quick brown" wraps first (longest); "quick" then finds no plain
        // occurrence and inserts nothing extra.
        let out = apply_highlights(
            "the quick brown fox",
            &[highlight("h1", "quick"), highlight("h2", "quick brown")],
        );
        assert_eq!(out.matches("<mark").count(), 1);
        assert!(out.contains("data-highlight-id=\"h2\""));
    }

    #[test]
    fn test_duplicate_highlights_each_wrap_every_occurrence() {
        let out = apply_highlights("fox and fox", &[highlight("h1", "fox")]);
        assert_eq!(out.matches("data-highlight-id=\"h1\"").count(), 2);
    }

    #[test]
    fn test_marker_resolves_back_to_id() {
        let out = apply_highlights("The quick fox", &[highlight("h-42", "quick")]);
        assert_eq!(marker_highlight_id(&out), Some("h-42".to_string()));
        assert_eq!(marker_highlight_id("<p>no marker</p>"), None);
    }

    #[test]
    fn test_attr_values_escaped() {
        let mut h = highlight("h1", "fox");
        h.color = "\"><script>".to_string();
        let out = apply_highlights("a fox", &[h]);
        assert!(!out.contains("<script>"));
        assert!(out.contains("&quot;&gt;&lt;script&gt;"));
    }
}
