//! Project data resolution over the fetcher and the caches.
//!
//! # Purpose
//! Answers the two read paths of the API:
//! - `user_projects(username)`: the listing for one portfolio user;
//! - `project_details(project_id)`: one project with embedded video players
//!   rewritten to direct media URLs.
//!
//! Both are memoized in their own cache. A miss drives the fetcher, stores the
//! transformed payload and persists it before returning; only complete records
//! become visible.
//!
//! # Failure policy
//! Fetch and parse failures are logged here and surface as `None`. Empty
//! listings are treated as not found and are never cached, so the next call
//! retries. Video resolution is best-effort per asset, see [`AssetResolution`].
use crate::model::{Asset, ProjectDetail, UserProjects};
use crate::scrape::{Fetcher, UpstreamUrls, extract, is_valid_identifier};
use crate::store::Caches;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of resolving one asset's embedded player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetResolution {
    /// The asset has no embedded player; nothing to do.
    NotEmbedded,
    /// Direct URL taken from the video-link cache.
    Cached(String),
    /// Direct URL freshly resolved through the browser.
    Resolved(String),
    /// Resolution failed; the asset keeps its original embed snippet.
    Unresolved {
        original: String,
        reason: UnresolvedReason,
    },
}

impl AssetResolution {
    fn label(&self) -> &'static str {
        match self {
            AssetResolution::NotEmbedded => "not_embedded",
            AssetResolution::Cached(_) => "cached",
            AssetResolution::Resolved(_) => "resolved",
            AssetResolution::Unresolved { .. } => "unresolved",
        }
    }

    pub fn direct_url(&self) -> Option<&str> {
        match self {
            AssetResolution::Cached(url) | AssetResolution::Resolved(url) => Some(url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The snippet carries no `src` attribute.
    NoSourceUrl,
    /// The player page rendered without a `<video><source>`.
    NoVideoElement,
    /// Rendering the player page failed.
    Fetch(String),
}

/// A freshly fetched project with its per-asset resolution outcomes.
#[derive(Debug, Clone)]
pub struct ResolvedProject {
    pub detail: Value,
    pub assets: Vec<AssetResolution>,
}

pub struct ProjectResolver {
    fetcher: Fetcher,
    urls: UpstreamUrls,
    caches: Arc<Caches>,
}

impl ProjectResolver {
    pub fn new(fetcher: Fetcher, urls: UpstreamUrls, caches: Arc<Caches>) -> Self {
        Self {
            fetcher,
            urls,
            caches,
        }
    }

    pub fn caches(&self) -> &Arc<Caches> {
        &self.caches
    }

    /// Cached listing for `username`, fetched and stored on a miss.
    pub async fn user_projects(&self, username: &str) -> Option<Value> {
        if let Some(cached) = self.caches.user_projects.get(username).await {
            metrics::counter!("folio_cache_hits_total", "cache" => "user_projects").increment(1);
            tracing::debug!(username, "returning cached user projects");
            return Some(cached);
        }
        metrics::counter!("folio_cache_misses_total", "cache" => "user_projects").increment(1);

        let payload = self.fetch_user_projects(username).await?;
        self.caches
            .user_projects
            .put(username, payload.clone())
            .await;
        tracing::info!(username, "cached user projects");
        Some(payload)
    }

    /// Fetch the listing for `username` from upstream, bypassing the cache.
    ///
    /// Returns `None` for invalid usernames, fetch or parse failures, and
    /// listings with no projects.
    pub async fn fetch_user_projects(&self, username: &str) -> Option<Value> {
        if !is_valid_identifier(username) {
            tracing::warn!(username, "rejecting invalid username");
            return None;
        }
        let url = self.urls.user_projects(username);
        let payload = match self.fetcher.fetch_json(&url).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(username, error = %err, "failed to fetch user projects");
                return None;
            }
        };
        let listing: UserProjects = match serde_json::from_value(payload.clone()) {
            Ok(listing) => listing,
            Err(err) => {
                tracing::error!(username, error = %err, "unexpected user projects payload");
                return None;
            }
        };
        if listing.data.is_empty() {
            tracing::info!(username, "user has no projects");
            return None;
        }
        tracing::debug!(username, projects = listing.data.len(), "fetched user projects");
        Some(payload)
    }

    /// Cached detail for `project_id`, fetched, resolved and stored on a miss.
    pub async fn project_details(&self, project_id: &str) -> Option<Value> {
        if let Some(cached) = self.caches.project_details.get(project_id).await {
            metrics::counter!("folio_cache_hits_total", "cache" => "project_details")
                .increment(1);
            tracing::debug!(project_id, "returning cached project details");
            return Some(cached);
        }
        metrics::counter!("folio_cache_misses_total", "cache" => "project_details").increment(1);

        let resolved = self.fetch_project_details(project_id).await?;
        self.caches
            .project_details
            .put(project_id, resolved.detail.clone())
            .await;
        tracing::info!(project_id, "cached project details");
        Some(resolved.detail)
    }

    /// Fetch one project from upstream and run the video-link resolution
    /// pass, bypassing the project-details cache.
    pub async fn fetch_project_details(&self, project_id: &str) -> Option<ResolvedProject> {
        if !is_valid_identifier(project_id) {
            tracing::warn!(project_id, "rejecting invalid project id");
            return None;
        }
        let url = self.urls.project_details(project_id);
        let payload = match self.fetcher.fetch_json(&url).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(project_id, error = %err, "failed to fetch project details");
                return None;
            }
        };
        let mut detail: ProjectDetail = match serde_json::from_value(payload) {
            Ok(detail) => detail,
            Err(err) => {
                tracing::error!(project_id, error = %err, "unexpected project details payload");
                return None;
            }
        };

        let assets = self.resolve_videos(&mut detail).await;
        let unresolved = assets
            .iter()
            .filter(|outcome| matches!(outcome, AssetResolution::Unresolved { .. }))
            .count();
        if unresolved > 0 {
            tracing::warn!(project_id, unresolved, "some video assets kept their embed");
        }

        match serde_json::to_value(&detail) {
            Ok(detail) => Some(ResolvedProject { detail, assets }),
            Err(err) => {
                tracing::error!(project_id, error = %err, "failed to serialize project details");
                None
            }
        }
    }

    /// Rewrite every embedded player in `detail` to its direct video URL.
    ///
    /// Returns one outcome per asset, in asset order. Failures leave the asset
    /// untouched and do not stop the pass. New links are written to the
    /// video-link cache once, at the end of the pass.
    pub async fn resolve_videos(&self, detail: &mut ProjectDetail) -> Vec<AssetResolution> {
        let mut outcomes = Vec::with_capacity(detail.assets.len());
        let mut learned: HashMap<String, String> = HashMap::new();

        for asset in &mut detail.assets {
            let source = asset.embed_snippet().and_then(extract::embed_source_url);
            let outcome = self.resolve_asset(asset, source.as_deref(), &learned).await;
            if outcome != AssetResolution::NotEmbedded {
                metrics::counter!("folio_video_resolutions_total", "outcome" => outcome.label())
                    .increment(1);
            }
            if let (AssetResolution::Resolved(direct), Some(source)) = (&outcome, source) {
                learned.insert(source, direct.clone());
            }
            if let Some(direct) = outcome.direct_url() {
                asset.player_embedded = Some(direct.to_string());
            }
            outcomes.push(outcome);
        }

        if !learned.is_empty() {
            let entries = learned
                .into_iter()
                .map(|(source, direct)| (source, Value::String(direct)));
            self.caches.video_links.put_many(entries).await;
        }
        outcomes
    }

    async fn resolve_asset(
        &self,
        asset: &Asset,
        source: Option<&str>,
        learned: &HashMap<String, String>,
    ) -> AssetResolution {
        let Some(snippet) = asset.embed_snippet() else {
            return AssetResolution::NotEmbedded;
        };
        let unresolved = |reason| AssetResolution::Unresolved {
            original: snippet.to_string(),
            reason,
        };
        let Some(source) = source else {
            return unresolved(UnresolvedReason::NoSourceUrl);
        };

        if let Some(direct) = learned.get(source) {
            return AssetResolution::Cached(direct.clone());
        }
        if let Some(direct) = self
            .caches
            .video_links
            .get(source)
            .await
            .and_then(|value| value.as_str().map(str::to_string))
        {
            metrics::counter!("folio_cache_hits_total", "cache" => "video_links").increment(1);
            return AssetResolution::Cached(direct);
        }
        metrics::counter!("folio_cache_misses_total", "cache" => "video_links").increment(1);

        tracing::info!(embed_url = %source, "resolving direct video link");
        match self.fetcher.fetch_media_url(source).await {
            Ok(Some(direct)) => AssetResolution::Resolved(direct),
            Ok(None) => {
                tracing::warn!(embed_url = %source, "player page has no video source");
                unresolved(UnresolvedReason::NoVideoElement)
            }
            Err(err) => {
                tracing::warn!(embed_url = %source, error = %err, "failed to resolve video link");
                unresolved(UnresolvedReason::Fetch(err.to_string()))
            }
        }
    }
}
