//! Caching module for EasySearch
//!
//! Caches whole aggregation results for a short time, keyed by everything
//! that can change the outcome of a call.

use crate::config::{CacheSettings, ProviderConfig};
use crate::results::AggregationResult;
use crate::search::SearchQuery;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Cache for aggregation results
#[derive(Clone)]
pub struct ResultCache {
    cache: Cache<String, AggregationResult>,
}

impl ResultCache {
    /// Create a new result cache with specified TTL
    pub fn new(ttl_seconds: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        Self { cache }
    }

    /// Cache configured by settings, or `None` when caching is off
    pub fn from_settings(settings: &CacheSettings) -> Option<Self> {
        settings
            .enabled
            .then(|| Self::new(settings.ttl_seconds, settings.max_capacity))
    }

    /// Get a cached result
    pub async fn get(&self, key: &str) -> Option<AggregationResult> {
        self.cache.get(key).await
    }

    /// Store a result in cache
    pub async fn set(&self, key: String, value: AggregationResult) {
        self.cache.insert(key, value).await;
    }

    /// Remove a cached result
    pub async fn remove(&self, key: &str) {
        self.cache.remove(key).await;
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Get cache size
    pub fn size(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        let settings = CacheSettings::default();
        Self::new(settings.ttl_seconds, settings.max_capacity)
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

/// Generate a cache key for one aggregation call.
///
/// Covers everything the call's outcome depends on: the query, the time
/// budget and the full configuration of every provider.
pub fn query_cache_key(
    query: &SearchQuery,
    configs: &[ProviderConfig],
    global_timeout: Duration,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.text.trim().as_bytes());
    hasher.update(b"\0");
    hasher.update(query.limit.map_or(0, |l| l as u64 + 1).to_le_bytes());

    for (name, enabled) in &query.overrides {
        hasher.update(name.as_bytes());
        hasher.update([u8::from(*enabled)]);
    }
    hasher.update(b"\0");
    hasher.update(global_timeout.as_nanos().to_le_bytes());

    for config in configs {
        hasher.update([u8::from(query.is_enabled(config))]);
        // Serialized form covers kind, endpoint, timeout, params and mapping
        match serde_json::to_vec(config) {
            Ok(bytes) => hasher.update(bytes),
            Err(_) => hasher.update(config.name.as_bytes()),
        }
        hasher.update(b"\0");
    }

    format!("{:x}", hasher.finalize())
}
