//! URL and link normalization for upstream encyclopedia markup.
//!
//! Pure, total functions over a single URL or `href` value. Media URLs in
//! upstream markup are frequently protocol-relative (`//upload.wikimedia.org/…`)
//! and article links come in several shapes (`/wiki/Dog`, `./Dog`,
//! `/wiki/Special:Random`, `#Anatomy`, fully absolute). Classification here
//! decides how the transformer rewrites each one; nothing in this module
//! touches a document tree.

use std::borrow::Cow;

/// Classification of a hyperlink `href`, as consumed by the transformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClass {
    /// In-page fragment (`#Anatomy`). Left untouched.
    Anchor,
    /// Already absolute (`http://` / `https://`). Marked to leave the app.
    ExternalAbsolute,
    /// A plain article link (`/wiki/Dog`, `./Dog`): slug has no namespace
    /// separator. Routed to the app-local article path.
    InternalWiki { slug: String },
    /// A namespaced page (`/wiki/Special:Random`, `./File:Dog.jpg`): kept on
    /// the upstream site and marked to open in a new browsing context.
    ExternalSpecial { slug: String },
    /// Any other relative href. Left untouched: guessing these into article
    /// routes would mis-route surviving asset links.
    RelativeOther,
}

/// Prefix a protocol-relative media URL with `https:`; any other value is
/// returned unchanged.
pub fn normalize_media_url(src: &str) -> Cow<'_, str> {
    if src.starts_with("//") {
        Cow::Owned(format!("https:{}", src))
    } else {
        Cow::Borrowed(src)
    }
}

/// Apply [`normalize_media_url`] to each candidate of a comma-separated
/// `srcset` value, preserving width/density descriptors.
pub fn normalize_srcset(srcset: &str) -> String {
    srcset
        .split(',')
        .map(|candidate| {
            let candidate = candidate.trim();
            match candidate.split_once(char::is_whitespace) {
                Some((url, descriptor)) => {
                    format!("{} {}", normalize_media_url(url), descriptor.trim())
                }
                None => normalize_media_url(candidate).into_owned(),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Classify an `href`. Total over any string: unrecognized shapes fall
/// through to [`LinkClass::RelativeOther`], never an error.
pub fn classify_link(href: &str) -> LinkClass {
    if href.starts_with('#') {
        return LinkClass::Anchor;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return LinkClass::ExternalAbsolute;
    }
    let slug = href
        .strip_prefix("/wiki/")
        .or_else(|| href.strip_prefix("./"));
    match slug {
        Some(slug) => {
            if slug.contains(':') {
                LinkClass::ExternalSpecial {
                    slug: slug.to_string(),
                }
            } else {
                LinkClass::InternalWiki {
                    slug: slug.to_string(),
                }
            }
        }
        None => LinkClass::RelativeOther,
    }
}
