//! Model descriptors
//!
//! Provides [`ModelDescriptor`], the framework metadata view of a logical
//! model: where it lives, what it is called, and whether its storage belongs
//! to another model.

use crate::naming::camel_case_to_spaces;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// How a model relates to its storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelKind {
    /// Owns its storage and identity
    Concrete,

    /// Alias sharing the storage and identity of the target model
    Proxy(Arc<ModelDescriptor>),

    /// Lazily loaded shadow of the target model
    Deferred(Arc<ModelDescriptor>),
}

/// Metadata for a logical model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    namespace: String,
    object_name: String,
    verbose_name: Option<String>,
    kind: ModelKind,
}

impl ModelDescriptor {
    /// Describe a concrete model
    #[must_use]
    pub fn concrete(namespace: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            object_name: object_name.into(),
            verbose_name: None,
            kind: ModelKind::Concrete,
        }
    }

    /// Describe a proxy of `target`
    #[must_use]
    pub fn proxy(
        namespace: impl Into<String>,
        object_name: impl Into<String>,
        target: ModelDescriptor,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            object_name: object_name.into(),
            verbose_name: None,
            kind: ModelKind::Proxy(Arc::new(target)),
        }
    }

    /// Describe the deferred shadow of `target` with `deferred_fields` left unloaded
    #[must_use]
    pub fn deferred(target: ModelDescriptor, deferred_fields: &[&str]) -> Self {
        let object_name = format!("{}_Deferred_{}", target.object_name, deferred_fields.join("_"));
        Self {
            namespace: target.namespace.clone(),
            object_name,
            verbose_name: target.verbose_name.clone(),
            kind: ModelKind::Deferred(Arc::new(target)),
        }
    }

    /// Set an explicit human-readable name
    #[inline]
    #[must_use]
    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    /// Namespace (application label) owning the model
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Object name as declared, e.g. `BlogArticle`
    #[inline]
    #[must_use]
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Lowercased object name used as the identity key
    #[inline]
    #[must_use]
    pub fn model_name(&self) -> String {
        self.object_name.to_lowercase()
    }

    /// Human-readable name, derived from the object name when not set
    #[must_use]
    pub fn verbose_name(&self) -> Cow<'_, str> {
        match &self.verbose_name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(camel_case_to_spaces(&self.object_name)),
        }
    }

    /// Storage relationship
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    /// Whether this model aliases another model
    #[inline]
    #[must_use]
    pub fn is_proxy(&self) -> bool {
        matches!(self.kind, ModelKind::Proxy(_))
    }

    /// Whether this model is a deferred shadow
    #[inline]
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self.kind, ModelKind::Deferred(_))
    }

    /// Target of a proxy
    #[inline]
    #[must_use]
    pub fn concrete_target(&self) -> Option<&ModelDescriptor> {
        match &self.kind {
            ModelKind::Proxy(target) => Some(target),
            _ => None,
        }
    }

    /// Model shadowed by a deferred descriptor
    #[inline]
    #[must_use]
    pub fn shadowed(&self) -> Option<&ModelDescriptor> {
        match &self.kind {
            ModelKind::Deferred(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.object_name)
    }
}
