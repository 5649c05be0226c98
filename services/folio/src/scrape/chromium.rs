//! Chromium-backed [`PageRenderer`].
//!
//! Each render launches its own headless browser with a throwaway profile
//! directory, so sessions share no cookies, cache or process. The browser is
//! closed and the profile removed on every path out of `render`, including
//! navigation errors and timeouts.
use super::{FetchError, FetchResult, PageRenderer, RenderedPage};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static SESSION_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Explicit Chrome/Chromium binary; autodetected when unset.
    pub chrome_executable: Option<PathBuf>,
    /// Upper bound on navigation plus content extraction.
    pub navigation_timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            navigation_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    config: RendererConfig,
}

impl ChromiumRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self, profile_dir: &Path) -> FetchResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .user_data_dir(profile_dir);
        if let Some(path) = &self.config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(FetchError::Browser)
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> FetchResult<RenderedPage> {
        let profile_dir = std::env::temp_dir().join(format!(
            "folio-chromium-{}-{}",
            std::process::id(),
            SESSION_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let config = self.browser_config(&profile_dir)?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| FetchError::Browser(err.to_string()))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::trace!(error = %err, "cdp handler error");
                }
            }
        });

        let timeout = self.config.navigation_timeout;
        let result = match tokio::time::timeout(timeout, navigate(&browser, url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        };

        if let Err(err) = browser.close().await {
            tracing::debug!(error = %err, "browser close failed");
        }
        if let Err(err) = browser.wait().await {
            tracing::debug!(error = %err, "browser wait failed");
        }
        handler_task.abort();
        let _ = handler_task.await;
        if let Err(err) = tokio::fs::remove_dir_all(&profile_dir).await {
            tracing::debug!(dir = %profile_dir.display(), error = %err, "profile cleanup failed");
        }

        result
    }
}

async fn navigate(browser: &Browser, url: &str) -> FetchResult<RenderedPage> {
    let unavailable = |err: chromiumoxide::error::CdpError| FetchError::UpstreamUnavailable {
        url: url.to_string(),
        reason: err.to_string(),
    };
    let page = browser.new_page(url).await.map_err(unavailable)?;
    page.wait_for_navigation().await.map_err(unavailable)?;
    let html = page.content().await.map_err(unavailable)?;
    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| url.to_string());
    tracing::debug!(url, final_url = %final_url, bytes = html.len(), "page rendered");
    Ok(RenderedPage {
        url: final_url,
        html,
    })
}
