//! Cache refresh walks and the recurring jobs that drive them.
//!
//! # Purpose
//! [`Refresher`] re-fetches every entry already present in a cache, bypassing
//! the resolver's cache short-circuit, and writes the results back with one
//! file rewrite per walk. [`RefreshScheduler`] runs the user-projects and
//! project-details walks as two independent fixed-interval jobs.
//!
//! # Invariants
//! - Single flight per cache: a walk that finds another walk of the same cache
//!   in progress (timer or manual) is skipped and reported as such.
//! - A failed re-fetch never replaces a populated entry; the previous value
//!   keeps serving until a later walk succeeds.
use crate::model::UserProjects;
use crate::resolver::ProjectResolver;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use utoipa::ToSchema;

/// Result of one walk over a cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RefreshReport {
    /// Entries replaced with fresh upstream data.
    pub refreshed: usize,
    /// Entries whose re-fetch failed and that kept their previous value.
    pub failed: usize,
    /// True when the walk did not run because another walk held the cache.
    pub skipped: bool,
}

impl RefreshReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Result of a full listing-then-details refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FullRefreshReport {
    pub user_projects: RefreshReport,
    pub project_details: RefreshReport,
}

pub struct Refresher {
    resolver: Arc<ProjectResolver>,
    user_projects_guard: Mutex<()>,
    project_details_guard: Mutex<()>,
}

impl Refresher {
    pub fn new(resolver: Arc<ProjectResolver>) -> Self {
        Self {
            resolver,
            user_projects_guard: Mutex::new(()),
            project_details_guard: Mutex::new(()),
        }
    }

    /// Re-fetch the listing of every cached username.
    pub async fn refresh_user_projects(&self) -> RefreshReport {
        let Ok(_guard) = self.user_projects_guard.try_lock() else {
            tracing::info!("user projects refresh already running, skipping");
            return RefreshReport::skipped();
        };
        let caches = self.resolver.caches();
        let mut report = RefreshReport::default();
        let mut updates = Vec::new();
        for username in caches.user_projects.keys().await {
            tracing::info!(username = %username, "refreshing cached user projects");
            match self.resolver.fetch_user_projects(&username).await {
                Some(payload) => {
                    report.refreshed += 1;
                    updates.push((username, payload));
                }
                None => {
                    report.failed += 1;
                    tracing::warn!(username = %username, "refresh failed, keeping cached user projects");
                }
            }
        }
        caches.user_projects.put_many(updates).await;
        record("user_projects", &report);
        report
    }

    /// Re-fetch and re-resolve every cached project.
    pub async fn refresh_project_details(&self) -> RefreshReport {
        let Ok(_guard) = self.project_details_guard.try_lock() else {
            tracing::info!("project details refresh already running, skipping");
            return RefreshReport::skipped();
        };
        let project_ids = self.resolver.caches().project_details.keys().await;
        let report = self.refresh_details_locked(project_ids).await;
        record("project_details", &report);
        report
    }

    /// Refresh every cached listing, then the details of every project those
    /// listings contain.
    ///
    /// Holds both cache guards for the whole run; if either is busy the whole
    /// refresh is skipped.
    pub async fn refresh_all(&self) -> FullRefreshReport {
        let (Ok(_users), Ok(_details)) = (
            self.user_projects_guard.try_lock(),
            self.project_details_guard.try_lock(),
        ) else {
            tracing::info!("refresh already running, skipping full refresh");
            return FullRefreshReport {
                user_projects: RefreshReport::skipped(),
                project_details: RefreshReport::skipped(),
            };
        };

        let caches = self.resolver.caches();
        let mut listings = RefreshReport::default();
        let mut updates = Vec::new();
        let mut project_ids = Vec::new();
        for username in caches.user_projects.keys().await {
            tracing::info!(username = %username, "refreshing cached user projects");
            let Some(payload) = self.resolver.fetch_user_projects(&username).await else {
                listings.failed += 1;
                tracing::warn!(username = %username, "refresh failed, keeping cached user projects");
                continue;
            };
            listings.refreshed += 1;
            project_ids.extend(listed_project_ids(&payload));
            updates.push((username, payload));
        }
        caches.user_projects.put_many(updates).await;
        record("user_projects", &listings);

        project_ids.sort();
        project_ids.dedup();
        let details = self.refresh_details_locked(project_ids).await;
        record("project_details", &details);

        FullRefreshReport {
            user_projects: listings,
            project_details: details,
        }
    }

    async fn refresh_details_locked(&self, project_ids: Vec<String>) -> RefreshReport {
        let mut report = RefreshReport::default();
        let mut updates = Vec::new();
        for project_id in project_ids {
            tracing::info!(project_id = %project_id, "refreshing cached project details");
            match self.resolver.fetch_project_details(&project_id).await {
                Some(resolved) => {
                    report.refreshed += 1;
                    updates.push((project_id, resolved.detail));
                }
                None => {
                    report.failed += 1;
                    tracing::warn!(project_id = %project_id, "refresh failed, keeping cached project details");
                }
            }
        }
        self.resolver
            .caches()
            .project_details
            .put_many(updates)
            .await;
        report
    }
}

fn listed_project_ids(payload: &Value) -> Vec<String> {
    match serde_json::from_value::<UserProjects>(payload.clone()) {
        Ok(listing) => listing.hash_ids().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

fn record(cache: &'static str, report: &RefreshReport) {
    if report.skipped {
        metrics::counter!("folio_refresh_skipped_total", "cache" => cache).increment(1);
        return;
    }
    metrics::counter!("folio_refresh_runs_total", "cache" => cache).increment(1);
    metrics::counter!("folio_refresh_failures_total", "cache" => cache)
        .increment(report.failed as u64);
    tracing::info!(
        cache,
        refreshed = report.refreshed,
        failed = report.failed,
        "cache refresh finished"
    );
}

/// Handles of the recurring refresh jobs. Dropping it leaves the jobs running;
/// call [`RefreshScheduler::shutdown`] to stop them.
pub struct RefreshScheduler {
    jobs: Vec<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Start both refresh jobs. The first run happens one full `period` after
    /// startup. Returns `None` when `period` is zero (refresh disabled).
    pub fn spawn(refresher: Arc<Refresher>, period: Duration) -> Option<Self> {
        if period.is_zero() {
            tracing::info!("cache refresh disabled");
            return None;
        }
        tracing::info!(period_secs = period.as_secs(), "cache refresh scheduled");
        let users = Arc::clone(&refresher);
        let details = refresher;
        Some(Self {
            jobs: vec![
                spawn_job("user_projects", period, move || {
                    let users = Arc::clone(&users);
                    async move {
                        users.refresh_user_projects().await;
                    }
                }),
                spawn_job("project_details", period, move || {
                    let details = Arc::clone(&details);
                    async move {
                        details.refresh_project_details().await;
                    }
                }),
            ],
        })
    }

    pub async fn shutdown(self) {
        for job in &self.jobs {
            job.abort();
        }
        for job in self.jobs {
            let _ = job.await;
        }
    }
}

fn spawn_job<F, Fut>(name: &'static str, period: Duration, run: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        // A run that outlasts the period delays the next one instead of
        // queueing a burst of catch-up runs.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            tracing::debug!(job = name, "refresh tick");
            run().await;
        }
    })
}
