//! Canonical identity resolution
//!
//! A proxy shares storage with its concrete target, so it must also share
//! the target's identity record. [`IdentityResolver`] reduces every
//! descriptor to its concrete model before asking the store, and caches the
//! answer per route.

use crate::cache::IdentityCache;
use crate::error::UnresolvedIdentityError;
use crate::key::{IdentityKey, IdentityRecord, StorageRoute};
use crate::store::{IdentityStore, Lookup, StoreError};
use compat_model::{truncate_display_name, ModelDescriptor, ModelKind};
use std::fmt;
use std::sync::Arc;

/// Display name a created identity record is seeded with
pub type DisplayNameFn = dyn Fn(&ModelDescriptor) -> String + Send + Sync;

/// Resolves model descriptors to their canonical identity record
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
    cache: IdentityCache,
    display_name: Arc<DisplayNameFn>,
}

impl IdentityResolver {
    /// Resolver with an unbounded cache
    #[must_use]
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self::with_cache(store, IdentityCache::new())
    }

    /// Resolver over an explicit cache
    #[must_use]
    pub fn with_cache(store: Arc<dyn IdentityStore>, cache: IdentityCache) -> Self {
        Self {
            store,
            cache,
            display_name: Arc::new(|model: &ModelDescriptor| model.verbose_name().into_owned()),
        }
    }

    /// Read display names through `accessor` instead of the descriptor
    ///
    /// The result is still truncated to the schema limit.
    #[must_use]
    pub fn with_display_name(mut self, accessor: Arc<DisplayNameFn>) -> Self {
        self.display_name = accessor;
        self
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }

    /// Identity cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    /// Identity record for `model` on `route`
    ///
    /// Deferred descriptors resolve as the model they shadow and proxies as
    /// their concrete target, so a proxy and its target always yield the
    /// same record.
    ///
    /// # Errors
    /// Returns [`UnresolvedIdentityError`] if the descriptor does not reduce
    /// to a concrete model or the store fails
    pub async fn resolve(
        &self,
        model: &ModelDescriptor,
        route: Option<&StorageRoute>,
    ) -> Result<IdentityRecord, UnresolvedIdentityError> {
        let reduced = reduce(model)?;
        let key = IdentityKey::for_model(reduced.model);

        if let Some(record) = self.cache.get(route, &key).await {
            tracing::debug!(%key, "identity cache hit");
            return Ok(record);
        }
        tracing::debug!(%key, "identity cache miss");

        let record = if reduced.via_proxy {
            self.resolve_proxied(reduced.model, &key, route).await?
        } else {
            let attempt = self.store.get_for_model(reduced.model, route).await;
            self.refetch_on_race(attempt, &key, route).await?
        };

        tracing::debug!(
            model = %model,
            %key,
            id = record.id,
            route = route.map(StorageRoute::as_str),
            "identity resolved"
        );
        self.cache.insert(route, key, record.clone()).await;
        Ok(record)
    }

    async fn resolve_proxied(
        &self,
        concrete: &ModelDescriptor,
        key: &IdentityKey,
        route: Option<&StorageRoute>,
    ) -> Result<IdentityRecord, UnresolvedIdentityError> {
        let attempt = match self.store.get_for_model_exact(concrete, route).await {
            Ok(Lookup::Supported(record)) => Ok(record),
            Ok(Lookup::Unsupported) => {
                let display_name = truncate_display_name(&(self.display_name)(concrete)).into_owned();
                self.store
                    .get_or_create(key, &display_name, route)
                    .await
                    .map(|(record, created)| {
                        if created {
                            tracing::debug!(%key, id = record.id, "identity record created");
                        }
                        record
                    })
            }
            Err(e) => Err(e),
        };
        self.refetch_on_race(attempt, key, route).await
    }

    /// A unique violation means a concurrent creator won; read its record
    async fn refetch_on_race(
        &self,
        attempt: Result<IdentityRecord, StoreError>,
        key: &IdentityKey,
        route: Option<&StorageRoute>,
    ) -> Result<IdentityRecord, UnresolvedIdentityError> {
        match attempt {
            Ok(record) => Ok(record),
            Err(StoreError::UniqueViolation { .. }) => {
                tracing::debug!(%key, "lost identity create race, re-fetching");
                self.store
                    .get(key, route)
                    .await?
                    .ok_or_else(|| UnresolvedIdentityError::RecordVanished { key: key.clone() })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

struct Reduced<'a> {
    model: &'a ModelDescriptor,
    via_proxy: bool,
}

// Deferred shadows first, then at most one proxy hop.
fn reduce(model: &ModelDescriptor) -> Result<Reduced<'_>, UnresolvedIdentityError> {
    let declared = model.shadowed().unwrap_or(model);

    match declared.kind() {
        ModelKind::Concrete => Ok(Reduced {
            model: declared,
            via_proxy: false,
        }),
        ModelKind::Proxy(target) if matches!(target.kind(), ModelKind::Concrete) => Ok(Reduced {
            model: target,
            via_proxy: true,
        }),
        ModelKind::Proxy(target) => Err(UnresolvedIdentityError::ProxyChainTooDeep {
            model: declared.to_string(),
            target: target.to_string(),
        }),
        ModelKind::Deferred(shadowed) => Err(UnresolvedIdentityError::NestedDeferral {
            model: model.to_string(),
            shadowed: shadowed.to_string(),
        }),
    }
}
