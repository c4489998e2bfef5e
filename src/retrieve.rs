//! Article retrieval orchestration.
//!
//! Sequences the full load of one article: connectivity check, concurrent
//! upstream fetches (summary + raw content + related links), content
//! transformation, highlight overlay, and offline-cache fallback. State
//! transitions are published on a `tokio::sync::watch` channel:
//!
//! ```text
//! Idle → Loading → { Ready, OfflineReady, Failed }
//! ```
//!
//! `Failed` is terminal for a navigation; a retry is a fresh `load()`.
//! Every load carries a generation token: a load superseded by a newer
//! navigation discards its result instead of publishing stale state.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::cache::{OfflineCache, StorageBackend};
use crate::highlight::apply_highlights;
use crate::models::{ArticleSummary, ArticleView, Highlight, RelatedArticle};
use crate::toc::build_outline;
use crate::transform::{transform_content, TransformOptions};

/// Upstream content endpoints consumed by the orchestrator. Failures are
/// transport-level; the orchestrator decides what is fatal.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_summary(&self, title: &str) -> Result<ArticleSummary>;
    /// `Ok(None)` means the article does not exist upstream.
    async fn fetch_raw_content(&self, title: &str) -> Result<Option<String>>;
    async fn fetch_related(&self, title: &str) -> Result<Vec<RelatedArticle>>;
}

/// The app's connectivity signal.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Fixed connectivity value; the CLI's `--offline` flag and tests use this.
pub struct StaticConnectivity(pub bool);

impl Connectivity for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.0
    }
}

/// Read access to the current article's highlight collection. The
/// orchestrator only reads; mutations belong to the owning collaborator.
pub trait HighlightSource: Send + Sync {
    fn highlights_for(&self, article_id: &str) -> Vec<Highlight>;
}

/// The empty highlight collection.
pub struct NoHighlights;

impl HighlightSource for NoHighlights {
    fn highlights_for(&self, _article_id: &str) -> Vec<Highlight> {
        Vec::new()
    }
}

/// Recently-viewed collaborator. Notified fire-and-forget on `Ready`;
/// never part of the load's success or failure.
pub trait RecentlyViewed: Send + Sync {
    fn note_view(&self, summary: &ArticleSummary);
}

/// Why a load was served from the offline store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfflineReason {
    /// The connectivity signal said offline; no network was attempted.
    Disconnected,
    /// The network was attempted and failed; the cache stood in.
    NetworkError,
}

/// Why a load failed terminally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// Offline, and the article is not in the offline store.
    UnavailableOffline,
    /// Upstream fetch failed and no cached copy exists.
    Fetch(String),
}

/// Observable state of one article navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready(Arc<ArticleView>),
    OfflineReady(Arc<ArticleView>, OfflineReason),
    Failed(FailReason),
}

pub struct Orchestrator<S: StorageBackend> {
    source: Arc<dyn ContentSource>,
    connectivity: Arc<dyn Connectivity>,
    highlights: Arc<dyn HighlightSource>,
    recents: Option<Arc<dyn RecentlyViewed>>,
    cache: Arc<OfflineCache<S>>,
    options: TransformOptions,
    state: watch::Sender<LoadState>,
    generation: AtomicU64,
}

impl<S: StorageBackend> Orchestrator<S> {
    pub fn new(
        source: Arc<dyn ContentSource>,
        connectivity: Arc<dyn Connectivity>,
        highlights: Arc<dyn HighlightSource>,
        cache: Arc<OfflineCache<S>>,
        options: TransformOptions,
    ) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            source,
            connectivity,
            highlights,
            recents: None,
            cache,
            options,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_recents(mut self, recents: Arc<dyn RecentlyViewed>) -> Self {
        self.recents = Some(recents);
        self
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    /// The current published state.
    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Load one article. Returns the terminal state this navigation reached;
    /// the watch channel only ever carries the newest navigation's states.
    pub async fn load(&self, title: &str) -> LoadState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish(generation, LoadState::Loading);

        let state = self.resolve(title).await;
        // Only the navigation that actually publishes `Ready` counts as a
        // view; a superseded load stays invisible to the recents list.
        if self.is_current(generation) {
            if let LoadState::Ready(view) = &state {
                if let (Some(recents), Some(summary)) = (&self.recents, &view.summary) {
                    recents.note_view(summary);
                }
            }
        }
        self.publish(generation, state.clone());
        state
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Publish only if this navigation has not been superseded.
    /// `send_replace` stores the value whether or not anyone subscribes, so
    /// `state()` always reflects the latest transition.
    fn publish(&self, generation: u64, state: LoadState) {
        if self.is_current(generation) {
            self.state.send_replace(state);
        }
    }

    async fn resolve(&self, title: &str) -> LoadState {
        if !self.connectivity.is_online() {
            return match self.cache.get(title) {
                Some(cached) => self.cached_view(title, &cached.content, OfflineReason::Disconnected),
                None => LoadState::Failed(FailReason::UnavailableOffline),
            };
        }

        let (summary, content, related) = tokio::join!(
            self.source.fetch_summary(title),
            self.source.fetch_raw_content(title),
            self.source.fetch_related(title),
        );

        // Related links are cosmetic: a failure never fails the load.
        let related = related.unwrap_or_else(|e| {
            eprintln!("Warning: related-links fetch failed for '{}': {}", title, e);
            Vec::new()
        });

        let (summary, raw) = match (summary, content) {
            (Ok(summary), Ok(Some(raw))) => (summary, raw),
            (summary, content) => {
                let reason = match (&summary, &content) {
                    (Err(e), _) => e.to_string(),
                    (_, Err(e)) => e.to_string(),
                    _ => format!("article not found upstream: {}", title),
                };
                return match self.cache.get(title) {
                    Some(cached) => {
                        self.cached_view(title, &cached.content, OfflineReason::NetworkError)
                    }
                    None => LoadState::Failed(FailReason::Fetch(reason)),
                };
            }
        };

        let transformed = transform_content(&raw, &self.options);
        let outline = build_outline(&transformed);
        let content = apply_highlights(&transformed, &self.highlights.highlights_for(title));

        LoadState::Ready(Arc::new(ArticleView {
            title: title.to_string(),
            summary: Some(summary),
            content,
            related,
            outline,
            from_cache: false,
        }))
    }

    /// Render path for cached content: identical to the online path from the
    /// overlay onward, just without summary or related links.
    fn cached_view(&self, title: &str, content: &str, reason: OfflineReason) -> LoadState {
        let outline = build_outline(content);
        let content = apply_highlights(content, &self.highlights.highlights_for(title));
        LoadState::OfflineReady(
            Arc::new(ArticleView {
                title: title.to_string(),
                summary: None,
                content,
                related: Vec::new(),
                outline,
                from_cache: true,
            }),
            reason,
        )
    }
}
