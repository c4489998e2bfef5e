//! Upstream content client over the MediaWiki REST API.
//!
//! The concrete [`ContentSource`] used in production. Three endpoints:
//!
//! - `GET {base}/api/rest_v1/page/summary/{title}` — summary metadata (JSON)
//! - `GET {base}/api/rest_v1/page/html/{title}` — raw article markup (HTML)
//! - `GET {base}/api/rest_v1/page/related/{title}` — related articles (JSON)
//!
//! Every request carries the configured timeout and gets one retry on
//! transient failure (transport error or 5xx). 4xx responses fail
//! immediately; a 404 on the content endpoint maps to `Ok(None)` so the
//! orchestrator can try the offline cache.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::UpstreamConfig;
use crate::models::{ArticleSummary, RelatedArticle};
use crate::retrieve::ContentSource;

pub struct HttpContentSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpContentSource {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("wikishelf/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid upstream base URL: {}", config.base_url))?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, kind: &str, title: &str) -> Url {
        // The REST API addresses pages with underscores for spaces; the
        // remaining reserved characters ('#', '?', '%', '/') are
        // percent-encoded as a single path segment so a title can never
        // truncate the request path.
        let title = title.trim().replace(' ', "_");
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "rest_v1", "page", kind, &title]);
        }
        url
    }

    /// GET with a single retry on transport errors and 5xx responses.
    async fn get_with_retry(&self, url: Url) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url.clone()).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_server_error() && attempt == 1 {
                        tokio::time::sleep(Duration::from_millis(250)).await;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(e) if attempt == 1 => {
                    eprintln!("Warning: retrying {} after transport error: {}", url, e);
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    title: String,
    #[serde(default)]
    pageid: i64,
    #[serde(default)]
    extract: String,
    thumbnail: Option<ThumbnailPayload>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailPayload {
    source: String,
}

#[derive(Debug, Deserialize)]
struct RelatedPayload {
    #[serde(default)]
    pages: Vec<SummaryPayload>,
}

impl From<SummaryPayload> for ArticleSummary {
    fn from(p: SummaryPayload) -> Self {
        ArticleSummary {
            title: p.title,
            page_id: p.pageid,
            extract: p.extract,
            thumbnail_url: p.thumbnail.map(|t| t.source),
        }
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_summary(&self, title: &str) -> Result<ArticleSummary> {
        let url = self.endpoint("summary", title);
        let resp = self.get_with_retry(url).await?;
        if !resp.status().is_success() {
            bail!("summary fetch failed for '{}': HTTP {}", title, resp.status());
        }
        let payload: SummaryPayload = resp.json().await?;
        Ok(payload.into())
    }

    async fn fetch_raw_content(&self, title: &str) -> Result<Option<String>> {
        let url = self.endpoint("html", title);
        let resp = self.get_with_retry(url).await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            bail!("content fetch failed for '{}': HTTP {}", title, resp.status());
        }
        Ok(Some(resp.text().await?))
    }

    async fn fetch_related(&self, title: &str) -> Result<Vec<RelatedArticle>> {
        let url = self.endpoint("related", title);
        let resp = self.get_with_retry(url).await?;
        if !resp.status().is_success() {
            bail!("related fetch failed for '{}': HTTP {}", title, resp.status());
        }
        let payload: RelatedPayload = resp.json().await?;
        Ok(payload
            .pages
            .into_iter()
            .map(|p| RelatedArticle {
                title: p.title,
                page_id: p.pageid,
                extract: if p.extract.is_empty() {
                    None
                } else {
                    Some(p.extract)
                },
                thumbnail_url: p.thumbnail.map(|t| t.source),
            })
            .collect())
    }
}
