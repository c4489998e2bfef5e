//! Core data models used throughout wikishelf.
//!
//! These types represent the articles, highlights, outline entries, and
//! cached records that flow through the transformation and retrieval
//! pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary metadata for an article, as returned by the upstream summary
/// endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    pub page_id: i64,
    pub extract: String,
    pub thumbnail_url: Option<String>,
}

/// A related article suggested by the upstream service. Cosmetic: a failed
/// related-links fetch never fails an article load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedArticle {
    pub title: String,
    pub page_id: i64,
    pub extract: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// A user highlight: an exact text fragment the reader marked inside an
/// article. Owned by the highlight collaborator; the overlay engine only
/// reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    pub article_id: String,
    pub text: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Highlight {
    /// Convenience constructor with a fresh UUID and the current time.
    pub fn new(article_id: &str, text: &str, color: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            article_id: article_id.to_string(),
            text: text.to_string(),
            color: color.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// One entry of the table-of-contents outline derived from a transformed
/// document. `level` is 2, 3, or 4 (the heading rank).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// An article saved for offline reading. `timestamp` is epoch milliseconds
/// of the last save; it drives eviction ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedArticle {
    pub title: String,
    pub content: String,
    pub timestamp: i64,
    #[serde(default)]
    pub images: Vec<String>,
}

/// The assembled view of a loaded article, handed to the rendering
/// collaborator. `content` is transformed HTML with highlights overlaid.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleView {
    pub title: String,
    pub summary: Option<ArticleSummary>,
    pub content: String,
    pub related: Vec<RelatedArticle>,
    pub outline: Vec<TocEntry>,
    pub from_cache: bool,
}
