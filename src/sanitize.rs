//! Markup sanitizer: strips editing chrome and non-content boxes from
//! upstream article markup.
//!
//! The denylist is fixed configuration, not user-extensible. Removal is
//! destructive — matched subtrees are detached entirely, never just hidden.

use dom_query::Document;

/// Selectors removed from every document before rendering: edit affordances,
/// citation markers, navigation and sister-site boxes, message boxes and
/// hatnotes, print-hidden elements, inline style/script, parser artifacts,
/// and page metadata.
pub const DISALLOWED_SELECTORS: &[&str] = &[
    "style",
    "script",
    ".mw-editsection",
    "sup.reference",
    ".navbox",
    ".vertical-navbox",
    ".sistersitebox",
    ".side-box",
    ".ambox",
    ".mbox-small",
    ".hatnote",
    ".noprint",
    ".mw-empty-elt",
    ".shortdescription",
    ".metadata",
];

/// Remove every element matching the denylist from the document, in place.
pub fn sanitize(doc: &Document) {
    for selector in DISALLOWED_SELECTORS {
        doc.select(selector).remove();
    }
}
