//! Resolver errors

use crate::key::IdentityKey;
use crate::store::StoreError;

/// Identity could not be resolved for a model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnresolvedIdentityError {
    /// A proxy's target is not a concrete model
    #[error("proxy '{model}' targets '{target}', which is not concrete")]
    ProxyChainTooDeep {
        /// The proxy being resolved
        model: String,
        /// Its non-concrete target
        target: String,
    },

    /// A deferred descriptor does not reduce to a concrete model
    #[error("deferred model '{model}' shadows '{shadowed}', which is not concrete")]
    NestedDeferral {
        /// The deferred descriptor
        model: String,
        /// What it shadows
        shadowed: String,
    },

    /// The backing store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A uniqueness violation was reported but no record exists
    #[error("identity record for {key} vanished after a concurrent create")]
    RecordVanished {
        /// Contended key
        key: IdentityKey,
    },
}

impl UnresolvedIdentityError {
    /// Check if the descriptor itself is at fault, not the store
    #[inline]
    #[must_use]
    pub fn is_descriptor_error(&self) -> bool {
        matches!(
            self,
            Self::ProxyChainTooDeep { .. } | Self::NestedDeferral { .. }
        )
    }

    /// Check if the store was unreachable
    #[inline]
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_unreachable())
    }
}
