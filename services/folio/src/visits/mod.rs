//! Append-only log of page loads reported by the front-end.
//!
//! The log is a single JSON array on disk. Appends are serialized by an
//! in-process lock and rewrite the whole file through a temp file and rename.
use crate::model::VisitRecord;
use crate::store::StoreError;
use crate::store::file::{read_json, write_json};
use chrono::Utc;
use serde_json::Value;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

pub mod user_agent;

pub use user_agent::{UserAgentInfo, classify};

const GEO_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum VisitLogError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// IP geolocation over a JSON HTTP service answering `GET {base}/{ip}`.
#[derive(Debug, Clone)]
pub struct GeoLocator {
    client: reqwest::Client,
    base: String,
}

impl GeoLocator {
    pub fn new(base: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(GEO_LOOKUP_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the service's JSON answer, or `None` on any failure.
    pub async fn locate(&self, ip: &str) -> Option<Value> {
        let url = format!("{}/{}", self.base, ip);
        let result = async {
            self.client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json::<Value>()
                .await
        }
        .await;
        match result {
            Ok(location) => Some(location),
            Err(err) => {
                tracing::warn!(ip, error = %err, "geolocation lookup failed");
                None
            }
        }
    }
}

/// A page load as seen by the HTTP layer.
#[derive(Debug, Clone)]
pub struct Visit {
    pub ip: String,
    pub user_agent: String,
    pub page: String,
}

#[derive(Debug)]
pub struct VisitLog {
    path: PathBuf,
    geo: Option<GeoLocator>,
    append_lock: Mutex<()>,
}

impl VisitLog {
    pub fn new(path: impl Into<PathBuf>, geo: Option<GeoLocator>) -> Self {
        Self {
            path: path.into(),
            geo,
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Classify, geolocate and append one visit. Returns the stored record.
    pub async fn record(&self, visit: Visit) -> Result<VisitRecord, VisitLogError> {
        let agent = classify(&visit.user_agent);
        let location = match &self.geo {
            Some(geo) => geo.locate(&visit.ip).await,
            None => None,
        };
        let record = VisitRecord {
            timestamp: Utc::now(),
            ip: visit.ip,
            device: agent.os,
            browser: agent.browser,
            platform: agent.platform,
            user_agent: visit.user_agent,
            page_accessed: visit.page,
            location,
        };
        tracing::info!(
            ip = %record.ip,
            device = %record.device,
            browser = %record.browser,
            platform = %record.platform,
            page = %record.page_accessed,
            "page load"
        );

        let entry = serde_json::to_value(&record).map_err(StoreError::from)?;
        let _guard = self.append_lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.push(entry);
        write_json(&self.path, &entries).await?;
        metrics::counter!("folio_visits_total").increment(1);
        Ok(record)
    }

    /// All stored records, oldest first. A missing file is an empty log.
    pub async fn read_all(&self) -> Result<Vec<Value>, VisitLogError> {
        let _guard = self.append_lock.lock().await;
        self.read_entries().await
    }

    async fn read_entries(&self) -> Result<Vec<Value>, VisitLogError> {
        Ok(read_json::<Vec<Value>>(&self.path).await?.unwrap_or_default())
    }
}

/// The caller's address: the first `x-forwarded-for` entry when present,
/// otherwise the socket peer.
pub fn client_ip(forwarded_for: Option<&str>, peer: Option<IpAddr>) -> String {
    forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|ip| ip.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
