use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::ApiError;

/// Shallow cache of API responses with a staleness window.
///
/// Entries are stored as JSON so one cache can hold any response type. An
/// entry older than the window is treated as absent and refetched on the
/// next read; mutations drop the affected keys with [`invalidate_prefix`].
///
/// [`invalidate_prefix`]: QueryCache::invalidate_prefix
pub struct QueryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

struct Entry {
    fetched_at: Instant,
    value: serde_json::Value,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A fresh entry for `key`, if any.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.write().await.insert(
                    key.to_string(),
                    Entry {
                        fetched_at: Instant::now(),
                        value,
                    },
                );
            }
            Err(e) => warn!("Not caching {}: {}", key, e),
        }
    }

    /// Return the fresh entry for `key` or run `fetch` and cache its result.
    /// Errors are never cached.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            debug!("cache hit {}", key);
            return Ok(hit);
        }
        let value = fetch().await?;
        self.put(key, &value).await;
        Ok(value)
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drop every key starting with `prefix`, e.g. all pages of a resource.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        debug!("invalidated {} entries under {}", before - entries.len(), prefix);
    }

    /// Remove entries past the staleness window.
    pub async fn purge_stale(&self) {
        let ttl = self.ttl;
        self.entries
            .write()
            .await
            .retain(|_, entry| entry.fetched_at.elapsed() < ttl);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
