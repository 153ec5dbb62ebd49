//! Opt-in cache for database-resolved nutrient profiles.
//!
//! Only database hits are stored. AI estimates vary between calls, so
//! caching them would freeze one arbitrary answer; they always go back to
//! the model.
//!
//! Keys are built from the normalized food name (trimmed, lower-cased) and
//! the normalized quantity, so `"Apple "` and `"apple"` share an entry.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use moka::future::Cache;

use crate::telemetry;
use crate::types::ResolvedNutrientProfile;

/// Configuration for the lookup cache.
///
/// Pass to [`PlatewiseBuilder::lookup_cache()`](crate::PlatewiseBuilder::lookup_cache)
/// to activate. Without this, no cache is allocated.
///
/// ```rust
/// # use platewise::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(5_000)
///     .ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 10,000.
    pub max_entries: u64,
    /// Time-to-live for cached entries. Default: 24 hours.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// In-memory cache of database-resolved profiles.
#[derive(Clone)]
pub struct LookupCache {
    cache: Cache<u64, ResolvedNutrientProfile>,
}

impl LookupCache {
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { cache }
    }

    /// Look up a cached profile. Emits cache hit/miss metrics.
    pub async fn get(&self, food_name: &str, quantity: &str) -> Option<ResolvedNutrientProfile> {
        let key = cache_key(food_name, quantity);
        match self.cache.get(&key).await {
            Some(profile) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "operation" => "lookup")
                    .increment(1);
                Some(profile)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => "lookup")
                    .increment(1);
                None
            }
        }
    }

    /// Store a profile for later requests.
    pub async fn insert(&self, food_name: &str, quantity: &str, profile: ResolvedNutrientProfile) {
        self.cache
            .insert(cache_key(food_name, quantity), profile)
            .await;
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

/// Hash of the normalized (name, quantity) pair.
///
/// `DefaultHasher` is stable within a process, which is all an in-memory
/// cache needs.
fn cache_key(food_name: &str, quantity: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    normalize(food_name).hash(&mut hasher);
    normalize(quantity).hash(&mut hasher);
    hasher.finish()
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
