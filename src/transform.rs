//! Content transformer: raw upstream markup → safe, locally-addressable HTML.
//!
//! Orchestrates the full rewrite over a parsed document:
//!
//! 1. Parse the raw markup.
//! 2. Strip denylisted elements ([`crate::sanitize`]).
//! 3. Normalize media URLs (`src`/`srcset`) and mark media lazily loadable.
//! 4. Rewrite hyperlinks per [`crate::normalize::classify_link`].
//! 5. Assign sequential `toc-heading-<n>` ids to retained h2/h3/h4 headings,
//!    so the outline and click-to-scroll share one stable identity.
//! 6. Serialize the main article container (fallback: whole body).
//!
//! Total over any input: malformed markup degrades to body serialization and
//! never panics.

use dom_query::Document;

use crate::normalize::{classify_link, normalize_media_url, normalize_srcset, LinkClass};
use crate::sanitize::sanitize;
use crate::toc::is_denylisted_heading;

/// The well-known container holding the article body in upstream markup.
const ARTICLE_CONTAINER: &str = ".mw-parser-output";

/// Attribute marking a link as in-app navigation.
pub const INTERNAL_LINK_ATTR: &str = "data-internal-link";

/// Prefix for heading ids assigned during the transform pass.
pub const HEADING_ID_PREFIX: &str = "toc-heading-";

/// Settings for a transform pass.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Upstream origin for namespaced links kept on the source site,
    /// e.g. `https://en.wikipedia.org`.
    pub upstream_base: String,
    /// App-local route prefix for internal article links, e.g. `/article/`.
    pub article_route: String,
    /// Whether to assign `toc-heading-<n>` ids during the pass.
    pub assign_heading_ids: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            upstream_base: "https://en.wikipedia.org".to_string(),
            article_route: "/article/".to_string(),
            assign_heading_ids: true,
        }
    }
}

impl TransformOptions {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            upstream_base: config.upstream.base_url.clone(),
            article_route: config.transform.article_route.clone(),
            assign_heading_ids: config.transform.assign_heading_ids,
        }
    }
}

/// Transform raw article markup into the renderable fragment.
pub fn transform_content(raw_html: &str, options: &TransformOptions) -> String {
    let doc = Document::from(raw_html);

    sanitize(&doc);
    rewrite_media(&doc);
    rewrite_links(&doc, options);
    if options.assign_heading_ids {
        assign_heading_ids(&doc);
    }

    let container = doc.select(ARTICLE_CONTAINER);
    if container.exists() {
        container.inner_html().to_string()
    } else {
        // Malformed or unexpected markup: degrade to the whole body rather
        // than failing the page.
        doc.select("body").inner_html().to_string()
    }
}

/// Normalize `src`/`srcset` on media elements and mark them lazily loadable.
fn rewrite_media(doc: &Document) {
    for img in doc.select("img").iter() {
        if let Some(src) = img.attr("src") {
            img.set_attr("src", &normalize_media_url(&src));
        }
        if let Some(srcset) = img.attr("srcset") {
            img.set_attr("srcset", &normalize_srcset(&srcset));
        }
        img.set_attr("loading", "lazy");
    }
    // <source> carries responsive candidates inside <picture>/<video>.
    for source in doc.select("source").iter() {
        if let Some(src) = source.attr("src") {
            source.set_attr("src", &normalize_media_url(&src));
        }
        if let Some(srcset) = source.attr("srcset") {
            source.set_attr("srcset", &normalize_srcset(&srcset));
        }
    }
}

/// Rewrite every hyperlink according to its classification.
fn rewrite_links(doc: &Document, options: &TransformOptions) {
    for link in doc.select("a[href]").iter() {
        let href = match link.attr("href") {
            Some(href) => href.to_string(),
            None => continue,
        };
        match classify_link(&href) {
            LinkClass::InternalWiki { slug } => {
                link.set_attr("href", &format!("{}{}", options.article_route, slug));
                link.set_attr(INTERNAL_LINK_ATTR, "true");
            }
            LinkClass::ExternalSpecial { slug } => {
                link.set_attr("href", &format!("{}/wiki/{}", options.upstream_base, slug));
                link.set_attr("target", "_blank");
                link.set_attr("rel", "noopener noreferrer");
                link.remove_attr(INTERNAL_LINK_ATTR);
            }
            LinkClass::ExternalAbsolute => {
                link.set_attr("target", "_blank");
                link.set_attr("rel", "noopener noreferrer");
            }
            // Anchors stay in-page; other relative hrefs are left alone
            // rather than guessed into article routes.
            LinkClass::Anchor | LinkClass::RelativeOther => {}
        }
    }
}

/// Assign sequential ids to retained headings. Skipped headings (empty or
/// denylisted text) get no id and produce no outline entry.
fn assign_heading_ids(doc: &Document) {
    let mut next = 0usize;
    for heading in doc.select("h2, h3, h4").iter() {
        let text = heading.text();
        let text = text.trim();
        if text.is_empty() || is_denylisted_heading(text) {
            continue;
        }
        heading.set_attr("id", &format!("{}{}", HEADING_ID_PREFIX, next));
        next += 1;
    }
}
