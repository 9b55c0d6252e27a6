//! Content-hash result cache.
//!
//! Maps the SHA-256 of an image to the last [`EnrichedResult`] computed for
//! it. Entries are written as `{...result, "timestamp": <epoch ms>}` under
//! `@ImageAnalysis_<hash>` in a [`KeyValueStore`].
//!
//! The cache is best-effort: every storage failure is logged and swallowed,
//! so from the caller's side it degrades to always-miss. Staleness is decided
//! on read (`now - timestamp >= ttl`); stale records are left in place and
//! simply overwritten by the next successful analysis.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::CacheConfig;
use crate::error::CacheIoError;
use crate::image::ContentHash;
use crate::model::EnrichedResult;

/// Namespace of analysis entries in the key-value store.
pub const CACHE_KEY_PREFIX: &str = "@ImageAnalysis_";

/// Local persistent key-value store holding serialized text.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, CacheIoError>;

    /// Overwrites any existing value.
    async fn set_item(&self, key: &str, value: String) -> Result<(), CacheIoError>;

    /// Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), CacheIoError>;

    async fn keys(&self) -> Result<Vec<String>, CacheIoError>;
}

/// Storage key of an analysis entry.
pub fn cache_key(hash: &ContentHash) -> String {
    format!("{CACHE_KEY_PREFIX}{hash}")
}

#[derive(Serialize)]
struct CacheEntryRef<'a> {
    #[serde(flatten)]
    value: &'a EnrichedResult,
    timestamp: i64,
}

#[derive(Deserialize)]
struct CacheEntry {
    #[serde(flatten)]
    value: EnrichedResult,
    timestamp: i64,
}

/// TTL-checked cache of analysis results.
#[derive(Clone)]
pub struct AnalysisCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl AnalysisCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// In-memory cache with the given TTL.
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new()), ttl)
    }

    /// File-backed cache when a directory is configured, in-memory otherwise.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheIoError> {
        match &config.dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "Using file-backed analysis cache");
                Ok(Self::new(Arc::new(FileStore::new(dir)?), config.ttl))
            }
            None => {
                tracing::warn!("LENS_CACHE_DIR not set, analysis cache is in-memory only");
                Ok(Self::in_memory(config.ttl))
            }
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store `value` for `key`, stamped with the current time.
    #[instrument(level = "debug", skip(self, value), fields(hash = %key))]
    pub async fn put(&self, key: &ContentHash, value: &EnrichedResult) {
        let entry = CacheEntryRef {
            value,
            timestamp: Utc::now().timestamp_millis(),
        };
        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to serialize analysis result for cache");
                return;
            }
        };
        match self.store.set_item(&cache_key(key), serialized).await {
            Ok(()) => debug!("Cached analysis result"),
            Err(e) => warn!(error = %e, "Failed to write analysis cache entry"),
        }
    }

    /// Fresh cached result for `key`, if any.
    #[instrument(level = "debug", skip(self), fields(hash = %key))]
    pub async fn get(&self, key: &ContentHash) -> Option<EnrichedResult> {
        let raw = match self.store.get_item(&cache_key(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read analysis cache entry");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Undecodable analysis cache entry, treating as miss");
                return None;
            }
        };

        let age_ms = Utc::now().timestamp_millis() - entry.timestamp;
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        if age_ms >= ttl_ms {
            debug!(age_ms, ttl_ms, "Cache entry expired");
            return None;
        }

        debug!(age_ms, "Cache hit");
        Some(entry.value)
    }

    /// Drop the entry for `key`.
    pub async fn remove(&self, key: &ContentHash) {
        if let Err(e) = self.store.remove_item(&cache_key(key)).await {
            warn!(error = %e, hash = %key, "Failed to remove analysis cache entry");
        }
    }

    /// Drop every analysis entry; keys outside the namespace are untouched.
    pub async fn clear(&self) {
        let keys = match self.store.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list analysis cache entries");
                return;
            }
        };
        for key in keys.iter().filter(|k| k.starts_with(CACHE_KEY_PREFIX)) {
            if let Err(e) = self.store.remove_item(key).await {
                warn!(error = %e, key = %key, "Failed to remove analysis cache entry");
            }
        }
    }
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LandmarkCandidate;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    /// Store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get_item(&self, _key: &str) -> Result<Option<String>, CacheIoError> {
            Err(std::io::Error::other("disk on fire").into())
        }
        async fn set_item(&self, _key: &str, _value: String) -> Result<(), CacheIoError> {
            Err(std::io::Error::other("disk on fire").into())
        }
        async fn remove_item(&self, _key: &str) -> Result<(), CacheIoError> {
            Err(std::io::Error::other("disk on fire").into())
        }
        async fn keys(&self) -> Result<Vec<String>, CacheIoError> {
            Err(std::io::Error::other("disk on fire").into())
        }
    }

    fn sample_result() -> EnrichedResult {
        EnrichedResult {
            landmarks: vec![LandmarkCandidate::from_landmark("Eiffel Tower", 0.93, None).unwrap()],
            description: Some("Wrought-iron lattice tower.".into()),
            ..Default::default()
        }
    }

    fn backdated_entry(result: &EnrichedResult, age: Duration) -> String {
        let timestamp = Utc::now().timestamp_millis() - age.as_millis() as i64;
        serde_json::to_string(&CacheEntryRef {
            value: result,
            timestamp,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_after_put_returns_value() {
        let cache = AnalysisCache::in_memory(DAY);
        let key = ContentHash::from_hex("abc123");
        cache.put(&key, &sample_result()).await;
        assert_eq!(cache.get(&key).await, Some(sample_result()));
    }

    #[tokio::test]
    async fn test_never_written_key_is_absent() {
        let cache = AnalysisCache::in_memory(DAY);
        assert!(cache.get(&ContentHash::from_hex("nope")).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_but_not_deleted() {
        let store = Arc::new(MemoryStore::new());
        let cache = AnalysisCache::new(store.clone(), DAY);
        let key = ContentHash::from_hex("abc123");

        store
            .set_item(&cache_key(&key), backdated_entry(&sample_result(), DAY + Duration::from_secs(60)))
            .await
            .unwrap();

        assert!(cache.get(&key).await.is_none());
        assert!(store.get_item(&cache_key(&key)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_entry_within_ttl_is_returned() {
        let store = Arc::new(MemoryStore::new());
        let cache = AnalysisCache::new(store.clone(), DAY);
        let key = ContentHash::from_hex("abc123");

        store
            .set_item(&cache_key(&key), backdated_entry(&sample_result(), Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(cache.get(&key).await, Some(sample_result()));
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = AnalysisCache::in_memory(Duration::ZERO);
        let key = ContentHash::from_hex("abc123");
        cache.put(&key, &sample_result()).await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_entry_layout_is_flat_with_timestamp() {
        let store = Arc::new(MemoryStore::new());
        let cache = AnalysisCache::new(store.clone(), DAY);
        let key = ContentHash::from_hex("abc123");
        cache.put(&key, &sample_result()).await;

        let raw = store
            .get_item("@ImageAnalysis_abc123")
            .await
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json["timestamp"].is_i64());
        assert_eq!(json["landmarks"][0]["name"], "Eiffel Tower");
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        let cache = AnalysisCache::new(store.clone(), DAY);
        store
            .set_item("@ImageAnalysis_abc123", "{not json".into())
            .await
            .unwrap();
        assert!(cache.get(&ContentHash::from_hex("abc123")).await.is_none());
    }

    #[tokio::test]
    async fn test_storage_failures_degrade_to_miss() {
        let cache = AnalysisCache::new(Arc::new(BrokenStore), DAY);
        let key = ContentHash::from_hex("abc123");
        cache.put(&key, &sample_result()).await;
        assert!(cache.get(&key).await.is_none());
        cache.remove(&key).await;
        cache.clear().await;
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = Arc::new(MemoryStore::new());
        let cache = AnalysisCache::new(store.clone(), DAY);
        let first = ContentHash::from_hex("first");
        let second = ContentHash::from_hex("second");
        cache.put(&first, &sample_result()).await;
        cache.put(&second, &sample_result()).await;
        store.set_item("@Settings_theme", "dark".into()).await.unwrap();

        cache.remove(&first).await;
        assert!(cache.get(&first).await.is_none());
        assert!(cache.get(&second).await.is_some());

        cache.clear().await;
        assert!(cache.get(&second).await.is_none());
        assert_eq!(
            store.get_item("@Settings_theme").await.unwrap().as_deref(),
            Some("dark")
        );
    }
}
