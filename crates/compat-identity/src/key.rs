//! Identity keys, records and storage routes

use compat_model::ModelDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural key of an identity record: `(namespace, model name)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    /// Namespace (application label)
    pub namespace: String,
    /// Lowercased model name
    pub model: String,
}

impl IdentityKey {
    /// Create key from parts
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            model: model.into(),
        }
    }

    /// Key of `model` as declared, without proxy resolution
    #[must_use]
    pub fn for_model(model: &ModelDescriptor) -> Self {
        Self::new(model.namespace(), model.model_name())
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.model)
    }
}

/// Persistent identity of a model type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Store-assigned identifier
    pub id: u64,
    /// Namespace (application label)
    pub namespace: String,
    /// Lowercased model name
    pub model: String,
    /// Human-readable name, already truncated to the schema limit
    pub display_name: String,
}

impl IdentityRecord {
    /// Natural key of this record
    #[must_use]
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(self.namespace.clone(), self.model.clone())
    }
}

/// Named storage route (connection alias) for identity lookups
///
/// `None` in resolver and store APIs selects the default route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageRoute(String);

impl StorageRoute {
    /// Create route from an alias
    #[inline]
    #[must_use]
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    /// Route alias
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StorageRoute {
    fn from(alias: &str) -> Self {
        Self::new(alias)
    }
}

impl fmt::Display for StorageRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
