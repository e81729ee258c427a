//! Declarative capability table
//!
//! Each patch name maps to a [`CapabilityRule`]: the version range, backend
//! and startup probe that must all hold for the patch to apply.

use crate::backend::BackendKind;
use crate::version::VersionRange;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Result of a startup probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The defect the patch fixes is present
    Positive,
    /// The defect is absent
    Negative,
    /// The probe could not tell
    Inconclusive(String),
}

/// Startup probe exercising the live framework object
pub type Probe = Arc<dyn Fn() -> ProbeOutcome + Send + Sync>;

/// Conditions under which a patch applies
///
/// Unset conditions always hold; a rule with nothing set is unconditional.
#[derive(Clone, Default)]
pub struct CapabilityRule {
    /// Framework versions affected
    pub version: Option<VersionRange>,
    /// Backend some connection must use
    pub backend: Option<BackendKind>,
    /// Probe that must report the defect
    pub probe: Option<Probe>,
}

impl CapabilityRule {
    /// Unconditional rule
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a version range
    #[inline]
    #[must_use]
    pub fn with_version(mut self, range: VersionRange) -> Self {
        self.version = Some(range);
        self
    }

    /// Require a connection on `backend`
    #[inline]
    #[must_use]
    pub fn on_backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Require a positive probe
    #[inline]
    #[must_use]
    pub fn with_probe<F>(mut self, probe: F) -> Self
    where
        F: Fn() -> ProbeOutcome + Send + Sync + 'static,
    {
        self.probe = Some(Arc::new(probe));
        self
    }
}

impl fmt::Debug for CapabilityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRule")
            .field("version", &self.version)
            .field("backend", &self.backend)
            .field("probe", &self.probe.as_ref().map(|_| "<probe>"))
            .finish()
    }
}

/// Patch name → capability rule, in registration order
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    rules: IndexMap<String, CapabilityRule>,
}

impl CapabilityTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rule for a patch, replacing any previous one
    pub fn insert(&mut self, name: impl Into<String>, rule: CapabilityRule) {
        self.rules.insert(name.into(), rule);
    }

    /// Builder form of [`insert`](Self::insert)
    #[inline]
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>, rule: CapabilityRule) -> Self {
        self.insert(name, rule);
        self
    }

    /// Rule for a patch
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CapabilityRule> {
        self.rules.get(name)
    }

    /// Registered patch names
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Detection verdict for one patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Applicability {
    /// Every condition holds
    Applicable,
    /// A condition was evaluated and does not hold
    NotApplicable(String),
    /// A required signal was missing
    Inconclusive(String),
}

impl Applicability {
    /// Whether the patch should be applied
    #[inline]
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Applicable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::FrameworkVersion;

    #[test]
    fn table_keeps_registration_order() {
        let table = CapabilityTable::new()
            .with_rule("b", CapabilityRule::new())
            .with_rule("a", CapabilityRule::new().on_backend(BackendKind::PostGis));

        assert_eq!(table.names(), vec!["b", "a"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").and_then(|r| r.backend.clone()), Some(BackendKind::PostGis));
    }

    #[test]
    fn rule_debug_hides_probe() {
        let rule = CapabilityRule::new()
            .with_version(VersionRange::below(FrameworkVersion::new(1, 4, 0)))
            .with_probe(|| ProbeOutcome::Negative);
        let debug = format!("{rule:?}");
        assert!(debug.contains("<probe>"));
    }

    #[test]
    fn only_applicable_applies() {
        assert!(Applicability::Applicable.is_applicable());
        assert!(!Applicability::NotApplicable("version".into()).is_applicable());
        assert!(!Applicability::Inconclusive("no connections".into()).is_applicable());
    }
}
