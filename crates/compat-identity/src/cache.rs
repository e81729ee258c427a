//! Per-route identity cache using moka
//!
//! Every storage route gets its own cache so records fetched through one
//! connection never answer lookups on another.

use crate::key::{IdentityKey, IdentityRecord, StorageRoute};
use dashmap::DashMap;
use moka::future::Cache;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of routes with a cache
    pub routes: usize,
    /// Entries across all routes
    pub entry_count: u64,
}

/// Identity records keyed by natural key, one cache per route
///
/// Entries never expire. With a capacity each route evicts on its own.
#[derive(Debug)]
pub struct IdentityCache {
    capacity: Option<u64>,
    default_route: Cache<IdentityKey, IdentityRecord>,
    named_routes: DashMap<StorageRoute, Cache<IdentityKey, IdentityRecord>>,
}

impl IdentityCache {
    /// Unbounded caches
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Caches holding at most `capacity` entries per route, unbounded for `None`
    #[must_use]
    pub fn with_capacity(capacity: Option<u64>) -> Self {
        Self {
            capacity,
            default_route: build_cache(capacity),
            named_routes: DashMap::new(),
        }
    }

    /// Per-route capacity
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> Option<u64> {
        self.capacity
    }

    /// Cached record for `key` on `route`
    pub async fn get(&self, route: Option<&StorageRoute>, key: &IdentityKey) -> Option<IdentityRecord> {
        self.route(route).get(key).await
    }

    /// Cache `record` under `key` on `route`
    pub async fn insert(&self, route: Option<&StorageRoute>, key: IdentityKey, record: IdentityRecord) {
        self.route(route).insert(key, record).await;
    }

    /// Flush pending maintenance so counts are exact
    pub async fn sync(&self) {
        self.default_route.run_pending_tasks().await;
        let named: Vec<_> = self.named_routes.iter().map(|c| c.value().clone()).collect();
        for cache in named {
            cache.run_pending_tasks().await;
        }
    }

    /// Approximate entry count on `route`
    #[must_use]
    pub fn entry_count(&self, route: Option<&StorageRoute>) -> u64 {
        match route {
            None => self.default_route.entry_count(),
            Some(route) => self
                .named_routes
                .get(route)
                .map_or(0, |cache| cache.entry_count()),
        }
    }

    /// Cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let named: u64 = self
            .named_routes
            .iter()
            .map(|cache| cache.value().entry_count())
            .sum();
        CacheStats {
            routes: 1 + self.named_routes.len(),
            entry_count: self.default_route.entry_count() + named,
        }
    }

    // Hands back a clone so no shard lock is held across an await.
    fn route(&self, route: Option<&StorageRoute>) -> Cache<IdentityKey, IdentityRecord> {
        match route {
            None => self.default_route.clone(),
            Some(route) => self
                .named_routes
                .entry(route.clone())
                .or_insert_with(|| build_cache(self.capacity))
                .clone(),
        }
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new()
    }
}

fn build_cache(capacity: Option<u64>) -> Cache<IdentityKey, IdentityRecord> {
    match capacity {
        Some(capacity) => Cache::builder().max_capacity(capacity).build(),
        None => Cache::builder().build(),
    }
}
