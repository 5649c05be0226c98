//! A single file-backed JSON cache.
//!
//! # Purpose
//! `CacheStore` keeps a `key -> JSON` map in memory and mirrors it to one
//! pretty-printed JSON object on disk.
//!
//! # Consistency
//! - Writes take the write lock, update memory, then rewrite the file while the
//!   lock is still held, so file writes are serialized and last writer wins.
//! - The file is written to a sibling `.tmp` file and renamed into place.
//! - Write failures are logged; callers never receive a failure signal.
use super::{StoreError, StoreResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct CacheStore {
    name: &'static str,
    path: PathBuf,
    entries: RwLock<Map<String, Value>>,
}

impl CacheStore {
    /// Load the cache at `path`.
    ///
    /// A missing file yields an empty cache and is created as `{}`. An
    /// unreadable or malformed file is logged and also yields an empty cache;
    /// the broken file is left alone until the next write replaces it.
    pub async fn load(name: &'static str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path).await {
            Ok(Some(entries)) => {
                tracing::info!(cache = name, entries = entries.len(), path = %path.display(), "cache loaded");
                entries
            }
            Ok(None) => {
                let empty = Map::new();
                if let Err(err) = write_entries(&path, &empty).await {
                    tracing::warn!(cache = name, error = %err, "failed to create cache file");
                }
                empty
            }
            Err(err) => {
                tracing::error!(cache = name, error = %err, "failed to load cache, starting empty");
                Map::new()
            }
        };
        Self {
            name,
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Keys in the cache at the time of the call.
    pub async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    pub async fn snapshot(&self) -> Map<String, Value> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Insert or replace one entry and rewrite the file.
    pub async fn put(&self, key: impl Into<String>, value: Value) {
        let mut entries = self.entries.write().await;
        entries.insert(key.into(), value);
        self.persist(&entries).await;
    }

    /// Insert or replace several entries with a single file rewrite.
    ///
    /// Does nothing (and skips the rewrite) when `items` is empty.
    pub async fn put_many<I>(&self, items: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return;
        }
        let mut entries = self.entries.write().await;
        entries.extend(items);
        self.persist(&entries).await;
    }

    /// Reset to `{}` in memory and on disk.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        self.persist(&entries).await;
    }

    async fn persist(&self, entries: &Map<String, Value>) {
        if let Err(err) = write_entries(&self.path, entries).await {
            metrics::counter!("folio_cache_persist_failures_total", "cache" => self.name)
                .increment(1);
            tracing::error!(cache = self.name, error = %err, "failed to persist cache");
        }
    }
}

/// Read a cache file. `Ok(None)` means the file does not exist.
pub(crate) async fn read_entries(path: &Path) -> StoreResult<Option<Map<String, Value>>> {
    read_json(path).await
}

pub(crate) async fn write_entries(path: &Path, entries: &Map<String, Value>) -> StoreResult<()> {
    write_json(path, entries).await
}

/// Read and decode a JSON file. `Ok(None)` means the file does not exist.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Pretty-print `value` to `path` through a sibling `.tmp` file and a rename.
pub(crate) async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}
