//! End-to-end pipeline tests: raw upstream markup through transform,
//! outline, overlay, and orchestrated retrieval with offline fallback.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use wikishelf::cache::{MemoryStorage, OfflineCache};
use wikishelf::highlight::apply_highlights;
use wikishelf::models::{ArticleSummary, Highlight, RelatedArticle};
use wikishelf::retrieve::{
    ContentSource, FailReason, HighlightSource, LoadState, Orchestrator, StaticConnectivity,
};
use wikishelf::toc::build_outline;
use wikishelf::transform::{transform_content, TransformOptions};

/// A cut-down but structurally faithful upstream article payload.
const RAW_ARTICLE: &str = r##"<html><body>
<div class="mw-parser-output">
  <p class="shortdescription">Small domesticated felid</p>
  <div class="hatnote">For other uses, see <a href="/wiki/Cat_(disambiguation)">Cat (disambiguation)</a></div>
  <p>The <b>cat</b> is a small carnivorous mammal.<sup class="reference">[1]</sup>
     It is related to the <a href="/wiki/Felidae">Felidae</a> and appears on
     <a href="/wiki/Special:WhatLinksHere/Cat">many pages</a>; see also
     <a href="https://www.iucnredlist.org/cat">the IUCN entry</a> and
     <a href="#Etymology">etymology below</a>.</p>
  <img src="//upload.wikimedia.org/thumb/Cat.jpg"
       srcset="//upload.wikimedia.org/thumb/Cat.jpg 1.5x, //upload.wikimedia.org/thumb/Cat2.jpg 2x">
  <h2>Etymology</h2>
  <p>The origin of the English word <i>cat</i> is disputed.</p>
  <h3>Terminology</h3>
  <p>A male cat is called a tom.</p>
  <h2>See also</h2>
  <ul><li><a href="/wiki/Bengal_cat">Bengal cat</a></li></ul>
  <h2>References</h2>
  <div class="navbox">Navigation template</div>
  <style>.infobox { color: red }</style>
</div>
</body></html>"##;

#[test]
fn test_transform_produces_safe_navigable_fragment() {
    let out = transform_content(RAW_ARTICLE, &TransformOptions::default());

    // Sanitizer completeness: no denylisted markup survives.
    for needle in [
        "<style",
        "<script",
        "shortdescription",
        "hatnote",
        "navbox",
        "class=\"reference\"",
    ] {
        assert!(!out.contains(needle), "denylisted fragment survived: {}", needle);
    }

    // Internal article links route into the app with the marker attribute.
    assert!(out.contains("href=\"/article/Felidae\""));
    assert!(out.contains("data-internal-link=\"true\""));

    // Namespaced pages stay on the upstream site, opened in a new context.
    assert!(out.contains("href=\"https://en.wikipedia.org/wiki/Special:WhatLinksHere/Cat\""));
    assert!(out.contains("rel=\"noopener noreferrer\""));

    // Absolute external links leave the app; anchors are untouched.
    assert!(out.contains("href=\"https://www.iucnredlist.org/cat\""));
    assert!(out.contains("href=\"#Etymology\""));

    // Media URLs are absolute and lazily loadable.
    assert!(out.contains("src=\"https://upload.wikimedia.org/thumb/Cat.jpg\""));
    assert!(out.contains(
        "srcset=\"https://upload.wikimedia.org/thumb/Cat.jpg 1.5x, \
         https://upload.wikimedia.org/thumb/Cat2.jpg 2x\""
    ));
    assert!(out.contains("loading=\"lazy\""));
}

#[test]
fn test_outline_skips_denylisted_sections() {
    let out = transform_content(RAW_ARTICLE, &TransformOptions::default());
    let outline = build_outline(&out);

    let texts: Vec<&str> = outline.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Etymology", "Terminology"]);
    assert_eq!(outline[0].level, 2);
    assert_eq!(outline[1].level, 3);
    assert_eq!(outline[0].id, "toc-heading-0");
}

#[test]
fn test_overlay_on_transformed_content() {
    let out = transform_content(RAW_ARTICLE, &TransformOptions::default());
    let highlights = vec![
        Highlight::new("Cat", "carnivorous mammal", "#ffe28a"),
        Highlight::new("Cat", "tom", "#a8d5ff"),
    ];
    let overlaid = apply_highlights(&out, &highlights);

    assert_eq!(overlaid.matches("carnivorous mammal</mark>").count(), 1);
    assert!(overlaid.contains(">tom</mark>"));
    // Identity on the empty set.
    assert_eq!(apply_highlights(&out, &[]), out);
}

struct ScriptedSource {
    raw: Option<String>,
    fail: bool,
}

#[async_trait]
impl ContentSource for ScriptedSource {
    async fn fetch_summary(&self, title: &str) -> Result<ArticleSummary> {
        if self.fail {
            anyhow::bail!("dns failure");
        }
        Ok(ArticleSummary {
            title: title.to_string(),
            page_id: 1,
            extract: "A small cat.".to_string(),
            thumbnail_url: None,
        })
    }

    async fn fetch_raw_content(&self, _title: &str) -> Result<Option<String>> {
        if self.fail {
            anyhow::bail!("dns failure");
        }
        Ok(self.raw.clone())
    }

    async fn fetch_related(&self, _title: &str) -> Result<Vec<RelatedArticle>> {
        Ok(Vec::new())
    }
}

struct OneHighlight(Highlight);

impl HighlightSource for OneHighlight {
    fn highlights_for(&self, _article_id: &str) -> Vec<Highlight> {
        vec![self.0.clone()]
    }
}

fn shelf() -> Arc<OfflineCache<MemoryStorage>> {
    Arc::new(OfflineCache::with_default_capacity(MemoryStorage::new()))
}

#[tokio::test]
async fn test_load_save_then_offline_round_trip() {
    let cache = shelf();

    // Online: load and shelve the transformed content.
    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedSource {
            raw: Some(RAW_ARTICLE.to_string()),
            fail: false,
        }),
        Arc::new(StaticConnectivity(true)),
        Arc::new(OneHighlight(Highlight::new("Cat", "tom", "#a8d5ff"))),
        cache.clone(),
        TransformOptions::default(),
    );
    let view = match orchestrator.load("Cat").await {
        LoadState::Ready(view) => view,
        other => panic!("expected Ready, got {:?}", other),
    };
    assert!(view.content.contains("/article/Felidae"));
    assert!(view.content.contains(">tom</mark>"));
    cache.save("Cat", &view.content, Vec::new()).unwrap();

    // Offline: the same article comes back from the shelf, same render path.
    let offline = Orchestrator::new(
        Arc::new(ScriptedSource {
            raw: None,
            fail: true,
        }),
        Arc::new(StaticConnectivity(false)),
        Arc::new(OneHighlight(Highlight::new("Cat", "tom", "#a8d5ff"))),
        cache.clone(),
        TransformOptions::default(),
    );
    match offline.load("Cat").await {
        LoadState::OfflineReady(view, _) => {
            assert!(view.from_cache);
            assert!(view.content.contains("/article/Felidae"));
            assert!(!view.outline.is_empty());
        }
        other => panic!("expected OfflineReady, got {:?}", other),
    }

    // A title never shelved is unavailable offline.
    match offline.load("Dog").await {
        LoadState::Failed(FailReason::UnavailableOffline) => {}
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_upstream_missing_article_without_cache_fails() {
    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedSource {
            raw: None,
            fail: false,
        }),
        Arc::new(StaticConnectivity(true)),
        Arc::new(wikishelf::retrieve::NoHighlights),
        shelf(),
        TransformOptions::default(),
    );
    match orchestrator.load("Nonexistent").await {
        LoadState::Failed(FailReason::Fetch(reason)) => {
            assert!(reason.contains("Nonexistent"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}
