//! ArtStation project payloads.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Listing payload returned by `/users/{username}/projects.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProjects {
    #[serde(default)]
    pub data: Vec<ProjectSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProjects {
    /// Hash ids of every listed project, in listing order.
    pub fn hash_ids(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|project| project.hash_id.as_str())
    }

    pub fn total_count(&self) -> Option<u64> {
        self.extra.get("total_count").and_then(Value::as_u64)
    }
}

/// One entry of a user's project listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSummary {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    /// Routing identifier; also the key of the project-details cache.
    pub hash_id: String,
    #[serde(default)]
    pub cover: Option<Cover>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cover {
    #[serde(default)]
    pub thumb_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full payload returned by `/projects/{hash_id}.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDetail {
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectDetail {
    pub fn hash_id(&self) -> Option<&str> {
        self.extra.get("hash_id").and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.extra.get("title").and_then(Value::as_str)
    }
}

/// One media asset of a project.
///
/// `player_embedded` holds the third-party player snippet until the asset is
/// resolved, and the direct video URL afterwards. Absent flags deserialize as
/// `false`/`null` and are written back explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    #[serde(default)]
    pub has_embedded_player: bool,
    #[serde(default)]
    pub player_embedded: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Asset {
    pub fn asset_type(&self) -> Option<&str> {
        self.extra.get("asset_type").and_then(Value::as_str)
    }

    /// The embed snippet, if this asset carries a player that still needs a
    /// direct URL.
    pub fn embed_snippet(&self) -> Option<&str> {
        if !self.has_embedded_player {
            return None;
        }
        self.player_embedded
            .as_deref()
            .filter(|snippet| !snippet.trim().is_empty())
    }
}
