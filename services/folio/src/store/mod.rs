//! Disk-backed JSON caches shared by the resolver, the HTTP layer and the
//! refresh scheduler.
//!
//! # Purpose
//! Each cache is a flat JSON object on disk (`key -> arbitrary JSON`) mirrored
//! by an in-memory map. The three caches are owned together by [`Caches`],
//! built once by the composition root and shared behind an `Arc`.
//!
//! # Durability
//! - Every mutation rewrites the whole file.
//! - Persistence failures are logged and swallowed; memory keeps serving.
//! - There is no schema versioning: a payload format change requires deleting
//!   the cache files by hand.
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod file;

pub use file::CacheStore;

pub const VIDEO_LINK_CACHE_FILE: &str = "videoLinkCache.json";
pub const USER_PROJECTS_CACHE_FILE: &str = "userProjectsCache.json";
pub const PROJECT_DETAILS_CACHE_FILE: &str = "projectDetailsCache.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The three caches backing the portfolio API.
///
/// - `video_links`: embed source URL -> direct media URL.
/// - `user_projects`: username -> project-list payload.
/// - `project_details`: project id -> project-detail payload (videos resolved).
#[derive(Debug)]
pub struct Caches {
    pub video_links: CacheStore,
    pub user_projects: CacheStore,
    pub project_details: CacheStore,
}

impl Caches {
    /// Hydrate all three caches from `dir`, creating empty files as needed.
    pub async fn load(dir: &Path) -> Self {
        if let Err(err) = tokio::fs::create_dir_all(dir).await {
            tracing::warn!(dir = %dir.display(), error = %err, "failed to create cache directory");
        }
        Self {
            video_links: CacheStore::load("video_links", dir.join(VIDEO_LINK_CACHE_FILE)).await,
            user_projects: CacheStore::load("user_projects", dir.join(USER_PROJECTS_CACHE_FILE))
                .await,
            project_details: CacheStore::load(
                "project_details",
                dir.join(PROJECT_DETAILS_CACHE_FILE),
            )
            .await,
        }
    }

    /// Reset every cache to `{}` in memory and on disk.
    pub async fn clear_all(&self) {
        self.video_links.clear().await;
        self.user_projects.clear().await;
        self.project_details.clear().await;
        tracing::info!("all caches cleared");
    }
}
