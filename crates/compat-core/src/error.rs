//! Error types for the compatibility layer

use crate::config::ConfigError;
use compat_identity::UnresolvedIdentityError;

/// Main compatibility layer error type
#[derive(Debug, thiserror::Error)]
pub enum CompatError {
    /// Configuration could not be loaded or applied
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A model's identity could not be resolved
    #[error("identity error: {0}")]
    Identity(#[from] UnresolvedIdentityError),
}

impl CompatError {
    /// Check if retrying later may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Identity(e) => e.is_unreachable(),
            Self::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compat_identity::StoreError;

    #[test]
    fn unreachable_store_is_retryable() {
        let err: CompatError = UnresolvedIdentityError::from(StoreError::unreachable("down")).into();
        assert!(err.is_retryable());

        let err: CompatError = UnresolvedIdentityError::from(StoreError::backend("constraint")).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn messages_carry_context() {
        let err: CompatError = ConfigError::UnsupportedFormat {
            path: "compat.yaml".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "configuration error: unsupported configuration format: compat.yaml"
        );
        assert!(!err.is_retryable());
    }
}
