//! Testing utilities for the compat workspace
//!
//! Shared fixtures and an in-memory identity store.

#![allow(missing_docs)]

use async_trait::async_trait;
use compat_detect::{BackendKind, ConnectionInfo, Environment, StaticConnections};
use compat_identity::{IdentityKey, IdentityRecord, IdentityStore, Lookup, StorageRoute, StoreError};
use compat_model::{truncate_display_name, ModelDescriptor};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

pub fn article() -> ModelDescriptor {
    ModelDescriptor::concrete("blog", "Article")
}

pub fn featured_article() -> ModelDescriptor {
    ModelDescriptor::proxy("blog", "FeaturedArticle", article())
}

pub fn deferred_article() -> ModelDescriptor {
    ModelDescriptor::deferred(article(), &["body"])
}

pub fn long_named_model() -> ModelDescriptor {
    ModelDescriptor::concrete("reports", "QuarterlyRevenueBreakdownByRegionAndProductLine")
}

pub fn environment(version: Option<&str>, backends: &[BackendKind]) -> Environment {
    let connections = backends
        .iter()
        .enumerate()
        .map(|(i, backend)| ConnectionInfo::new(format!("db{i}"), backend.clone()))
        .collect();
    Environment::new(
        version.map(|v| v.parse().unwrap()),
        Arc::new(StaticConnections::new(connections)),
    )
}

pub fn legacy_postgis_environment() -> Environment {
    environment(Some("1.3.7"), &[BackendKind::PostGis])
}

/// Call counts observed by [`InMemoryIdentityStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub get_for_model: usize,
    pub get_for_model_exact: usize,
    pub get_or_create: usize,
    pub get: usize,
    pub created: usize,
}

impl StoreCalls {
    pub fn total(&self) -> usize {
        self.get_for_model + self.get_for_model_exact + self.get_or_create + self.get
    }
}

type RouteKey = (Option<StorageRoute>, IdentityKey);

/// Identity store backed by a concurrent map, one keyspace per route
#[derive(Debug)]
pub struct InMemoryIdentityStore {
    records: DashMap<RouteKey, IdentityRecord>,
    next_id: AtomicU64,
    supports_exact: AtomicBool,
    unreachable: AtomicBool,
    violations: AtomicUsize,
    phantom_violations: AtomicUsize,
    get_for_model: AtomicUsize,
    get_for_model_exact: AtomicUsize,
    get_or_create: AtomicUsize,
    get: AtomicUsize,
    created: AtomicUsize,
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityStore {
    /// Store with the exact lookup available
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
            supports_exact: AtomicBool::new(true),
            unreachable: AtomicBool::new(false),
            violations: AtomicUsize::new(0),
            phantom_violations: AtomicUsize::new(0),
            get_for_model: AtomicUsize::new(0),
            get_for_model_exact: AtomicUsize::new(0),
            get_or_create: AtomicUsize::new(0),
            get: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
        }
    }

    /// Store answering `Unsupported` to exact lookups
    pub fn without_exact_lookup() -> Self {
        let store = Self::new();
        store.set_supports_exact(false);
        store
    }

    pub fn set_supports_exact(&self, supported: bool) {
        self.supports_exact.store(supported, Ordering::SeqCst);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Next `count` creates lose to a simulated concurrent writer
    ///
    /// Applies to every lookup that may insert, not only `get_or_create`.
    pub fn lose_next_creates(&self, count: usize) {
        self.violations.store(count, Ordering::SeqCst);
    }

    /// Next `count` creates report a violation but leave no record behind
    pub fn phantom_next_creates(&self, count: usize) {
        self.phantom_violations.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            get_for_model: self.get_for_model.load(Ordering::SeqCst),
            get_for_model_exact: self.get_for_model_exact.load(Ordering::SeqCst),
            get_or_create: self.get_or_create.load(Ordering::SeqCst),
            get: self.get.load(Ordering::SeqCst),
            created: self.created.load(Ordering::SeqCst),
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(StoreError::unreachable("in-memory store switched off"))
        } else {
            Ok(())
        }
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn upsert(
        &self,
        key: &IdentityKey,
        display_name: &str,
        route: Option<&StorageRoute>,
    ) -> (IdentityRecord, bool) {
        match self.records.entry((route.cloned(), key.clone())) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => {
                let record = IdentityRecord {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst),
                    namespace: key.namespace.clone(),
                    model: key.model.clone(),
                    display_name: display_name.to_string(),
                };
                slot.insert(record.clone());
                self.created.fetch_add(1, Ordering::SeqCst);
                (record, true)
            }
        }
    }

    /// Upsert that honours the injected create races
    fn create(
        &self,
        key: &IdentityKey,
        display_name: &str,
        route: Option<&StorageRoute>,
    ) -> Result<(IdentityRecord, bool), StoreError> {
        if Self::take(&self.phantom_violations) {
            return Err(StoreError::UniqueViolation { key: key.clone() });
        }
        if Self::take(&self.violations) {
            self.upsert(key, display_name, route);
            return Err(StoreError::UniqueViolation { key: key.clone() });
        }
        Ok(self.upsert(key, display_name, route))
    }
}

fn display_name(model: &ModelDescriptor) -> String {
    truncate_display_name(&model.verbose_name()).into_owned()
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn get_for_model(
        &self,
        model: &ModelDescriptor,
        route: Option<&StorageRoute>,
    ) -> Result<IdentityRecord, StoreError> {
        self.get_for_model.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        tokio::task::yield_now().await;
        let key = IdentityKey::for_model(model);
        Ok(self.create(&key, &display_name(model), route)?.0)
    }

    async fn get_for_model_exact(
        &self,
        model: &ModelDescriptor,
        route: Option<&StorageRoute>,
    ) -> Result<Lookup<IdentityRecord>, StoreError> {
        self.get_for_model_exact.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        if !self.supports_exact.load(Ordering::SeqCst) {
            return Ok(Lookup::Unsupported);
        }
        tokio::task::yield_now().await;
        let key = IdentityKey::for_model(model);
        Ok(Lookup::Supported(self.create(&key, &display_name(model), route)?.0))
    }

    async fn get_or_create(
        &self,
        key: &IdentityKey,
        display_name: &str,
        route: Option<&StorageRoute>,
    ) -> Result<(IdentityRecord, bool), StoreError> {
        self.get_or_create.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        tokio::task::yield_now().await;
        self.create(key, display_name, route)
    }

    async fn get(
        &self,
        key: &IdentityKey,
        route: Option<&StorageRoute>,
    ) -> Result<Option<IdentityRecord>, StoreError> {
        self.get.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        Ok(self
            .records
            .get(&(route.cloned(), key.clone()))
            .map(|record| record.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn concurrent_creates_produce_one_record() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let key = IdentityKey::new("blog", "article");

        let calls = (0..8).map(|_| {
            let store = Arc::clone(&store);
            let key = key.clone();
            tokio::spawn(async move { store.get_or_create(&key, "article", None).await })
        });
        let results = futures::future::join_all(calls).await;

        let created = results
            .into_iter()
            .map(|r| r.unwrap().unwrap().1)
            .filter(|created| *created)
            .count();
        assert_eq!(created, 1);
        assert_eq!(store.calls().created, 1);
    }

    #[tokio::test]
    async fn lost_create_leaves_winner_record() {
        let store = InMemoryIdentityStore::new();
        let key = IdentityKey::new("blog", "article");
        store.lose_next_creates(1);

        let err = store.get_or_create(&key, "article", None).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert!(store.get(&key, None).await.unwrap().is_some());
    }
}
