//! Behavior slots and idempotency markers
//!
//! A [`Slot`] is a named extension point on a framework object. Patches read
//! the current behavior, wrap it, and rebind the slot; the framework keeps
//! calling through the slot and never notices the swap.

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Rebindable behavior of a shared framework object
pub struct Slot<F: ?Sized> {
    name: &'static str,
    behavior: RwLock<Arc<F>>,
}

impl<F: ?Sized> Slot<F> {
    /// Create slot bound to `behavior`
    #[inline]
    #[must_use]
    pub fn new(name: &'static str, behavior: Arc<F>) -> Self {
        Self {
            name,
            behavior: RwLock::new(behavior),
        }
    }

    /// Slot name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Capture the current behavior
    #[inline]
    #[must_use]
    pub fn current(&self) -> Arc<F> {
        Arc::clone(&self.behavior.read())
    }

    /// Atomically install `behavior`, returning the one it replaced
    pub fn rebind(&self, behavior: Arc<F>) -> Arc<F> {
        std::mem::replace(&mut *self.behavior.write(), behavior)
    }

    /// Whether the slot still holds exactly `behavior`
    #[must_use]
    pub fn is_bound_to(&self, behavior: &Arc<F>) -> bool {
        Arc::ptr_eq(&self.behavior.read(), behavior)
    }
}

impl<F: ?Sized> fmt::Debug for Slot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Idempotency markers recorded on a patched object
#[derive(Debug, Default)]
pub struct PatchMarkers {
    applied: Mutex<BTreeSet<&'static str>>,
}

impl PatchMarkers {
    /// Create empty marker set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `marker` has been recorded
    #[must_use]
    pub fn contains(&self, marker: &str) -> bool {
        self.applied.lock().contains(marker)
    }

    /// Record `marker`; returns `false` if it was already present
    pub fn record(&self, marker: &'static str) -> bool {
        self.applied.lock().insert(marker)
    }

    /// Recorded markers, sorted
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        self.applied.lock().iter().copied().collect()
    }
}
