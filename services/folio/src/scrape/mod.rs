//! Headless-browser fetching of upstream portfolio data.
//!
//! # Purpose
//! The upstream site filters plain HTTP clients, so every request goes through
//! a rendered browser page. A [`PageRenderer`] turns a URL into the rendered
//! DOM; the [`Fetcher`] then extracts content from it in one of two modes:
//! - text-JSON: the JSON document shown in the page's `<pre>` block;
//! - media-URL: the `src` of the first `<video><source>` element.
//!
//! # Errors
//! Every failure is a typed [`FetchError`]. Callers in the resolver log it and
//! treat the lookup as not found; nothing here panics or retries.
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod chromium;
pub mod extract;

pub use chromium::{ChromiumRenderer, RendererConfig};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("browser session failed: {0}")]
    Browser(String),
    #[error("navigation to {url} failed: {reason}")]
    UpstreamUnavailable { url: String, reason: String },
    #[error("navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("page has no JSON text block")]
    MissingPayload,
    #[error("malformed JSON payload: {0}")]
    ParseFailure(#[from] serde_json::Error),
}

impl FetchError {
    /// Short stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Browser(_) => "browser",
            FetchError::UpstreamUnavailable { .. } => "upstream_unavailable",
            FetchError::Timeout { .. } => "timeout",
            FetchError::MissingPayload => "missing_payload",
            FetchError::ParseFailure(_) => "parse_failure",
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// A page after rendering: the URL the browser ended on and its serialized DOM.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

/// Renders a URL in an isolated browser session.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> FetchResult<RenderedPage>;
}

/// Extraction front-end over a [`PageRenderer`].
#[derive(Clone)]
pub struct Fetcher {
    renderer: Arc<dyn PageRenderer>,
}

impl Fetcher {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self { renderer }
    }

    /// Text-JSON mode.
    pub async fn fetch_json(&self, url: &str) -> FetchResult<Value> {
        let page = self.render(url, "json").await?;
        extract::pre_json(&page.html)
    }

    /// Media-URL mode. `Ok(None)` means the page rendered but had no video
    /// source.
    pub async fn fetch_media_url(&self, url: &str) -> FetchResult<Option<String>> {
        let page = self.render(url, "media").await?;
        Ok(extract::video_source(&page.html, &page.url))
    }

    async fn render(&self, url: &str, mode: &'static str) -> FetchResult<RenderedPage> {
        metrics::counter!("folio_upstream_fetches_total", "mode" => mode).increment(1);
        let started = std::time::Instant::now();
        let result = self.renderer.render(url).await;
        metrics::histogram!("folio_upstream_fetch_seconds", "mode" => mode)
            .record(started.elapsed().as_secs_f64());
        if let Err(err) = &result {
            metrics::counter!("folio_upstream_failures_total", "mode" => mode, "kind" => err.kind())
                .increment(1);
        }
        result
    }
}

/// Upstream endpoint layout.
#[derive(Debug, Clone)]
pub struct UpstreamUrls {
    base: String,
}

impl UpstreamUrls {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        url::Url::parse(base)?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn user_projects(&self, username: &str) -> String {
        format!("{}/users/{}/projects.json", self.base, username)
    }

    pub fn project_details(&self, project_id: &str) -> String {
        format!("{}/projects/{}.json", self.base, project_id)
    }
}

/// Usernames and project ids are spliced into upstream URLs; only plain
/// identifiers are accepted.
pub fn is_valid_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 128
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}
