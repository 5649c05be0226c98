//! Visit-log record.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `/api/load` hit as persisted in the visit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub timestamp: DateTime<Utc>,
    pub ip: String,
    /// Operating system family, e.g. `Windows` or `iOS`.
    pub device: String,
    pub browser: String,
    pub platform: String,
    pub user_agent: String,
    pub page_accessed: String,
    /// Geolocation payload as returned by the lookup service, `null` when the
    /// lookup is disabled or failed.
    pub location: Option<Value>,
}
