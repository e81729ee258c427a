//! Backing identity store
//!
//! The resolver never talks to a database directly. Hosts implement
//! [`IdentityStore`] over whatever persistence they run; the store owns the
//! at-most-one-create guarantee for each key.

use crate::key::{IdentityKey, IdentityRecord, StorageRoute};
use compat_model::ModelDescriptor;

/// Answer from a lookup the store may not implement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The store implements the lookup and produced a value
    Supported(T),
    /// The store has no such lookup
    Unsupported,
}

impl<T> Lookup<T> {
    /// Value if the lookup was supported
    #[inline]
    pub fn supported(self) -> Option<T> {
        match self {
            Self::Supported(value) => Some(value),
            Self::Unsupported => None,
        }
    }

    /// Check if the store lacks the lookup
    #[inline]
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported)
    }
}

/// Errors surfaced by an identity store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store could not be reached
    #[error("identity store unreachable: {0}")]
    Unreachable(String),

    /// Another writer created the record first
    #[error("identity record for {key} already exists")]
    UniqueViolation {
        /// Contended key
        key: IdentityKey,
    },

    /// Any other store failure
    #[error("identity store failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create unreachable error
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable(reason.into())
    }

    /// Create backend error
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend(reason.into())
    }

    /// Check if the store was unreachable
    #[inline]
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// Check if a concurrent create won
    #[inline]
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// Check if retrying later may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_unreachable()
    }
}

/// Persistent identity records
///
/// Every method honors `route`; `None` selects the default route.
#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    /// Standard lookup for a concrete model, creating its record on first use
    async fn get_for_model(
        &self,
        model: &ModelDescriptor,
        route: Option<&StorageRoute>,
    ) -> Result<IdentityRecord, StoreError>;

    /// Lookup that never substitutes another model's identity
    ///
    /// Stores without this lookup answer [`Lookup::Unsupported`].
    async fn get_for_model_exact(
        &self,
        model: &ModelDescriptor,
        route: Option<&StorageRoute>,
    ) -> Result<Lookup<IdentityRecord>, StoreError>;

    /// Fetch the record for `key`, creating it with `display_name` if absent
    ///
    /// Returns the record and whether this call created it. A concurrent
    /// create may surface as [`StoreError::UniqueViolation`].
    async fn get_or_create(
        &self,
        key: &IdentityKey,
        display_name: &str,
        route: Option<&StorageRoute>,
    ) -> Result<(IdentityRecord, bool), StoreError>;

    /// Fetch the record for `key`
    async fn get(
        &self,
        key: &IdentityKey,
        route: Option<&StorageRoute>,
    ) -> Result<Option<IdentityRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_unwraps_supported() {
        assert_eq!(Lookup::Supported(3).supported(), Some(3));
        assert_eq!(Lookup::<u8>::Unsupported.supported(), None);
        assert!(Lookup::<u8>::Unsupported.is_unsupported());
    }

    #[test]
    fn only_unreachable_is_retryable() {
        assert!(StoreError::unreachable("down").is_retryable());
        assert!(!StoreError::backend("bad row").is_retryable());
        let violation = StoreError::UniqueViolation {
            key: IdentityKey::new("blog", "article"),
        };
        assert!(violation.is_unique_violation());
        assert!(!violation.is_retryable());
        assert_eq!(
            violation.to_string(),
            "identity record for blog.article already exists"
        );
    }
}
