//! Capability detector
//!
//! Evaluates the [`CapabilityTable`] against the running [`Environment`].
//! Each patch is assessed at most once; later queries read the memoized
//! verdict.

use crate::backend::ConnectionRegistry;
use crate::capability::{Applicability, CapabilityRule, CapabilityTable, ProbeOutcome};
use crate::version::FrameworkVersion;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// What the detector can observe about the running framework
#[derive(Clone)]
pub struct Environment {
    framework_version: Option<FrameworkVersion>,
    connections: Arc<dyn ConnectionRegistry>,
}

impl Environment {
    /// Create environment
    #[inline]
    #[must_use]
    pub fn new(
        framework_version: Option<FrameworkVersion>,
        connections: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            framework_version,
            connections,
        }
    }

    /// Declared framework version, if known
    #[inline]
    #[must_use]
    pub fn framework_version(&self) -> Option<FrameworkVersion> {
        self.framework_version
    }

    /// Connection registry
    #[inline]
    #[must_use]
    pub fn connections(&self) -> &Arc<dyn ConnectionRegistry> {
        &self.connections
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("framework_version", &self.framework_version)
            .finish_non_exhaustive()
    }
}

/// Decides, per patch, whether it applies
#[derive(Debug)]
pub struct CapabilityDetector {
    environment: Environment,
    table: CapabilityTable,
    verdicts: DashMap<String, Applicability>,
}

impl CapabilityDetector {
    /// Create detector
    #[must_use]
    pub fn new(environment: Environment, table: CapabilityTable) -> Self {
        Self {
            environment,
            table,
            verdicts: DashMap::new(),
        }
    }

    /// Capability table in use
    #[inline]
    #[must_use]
    pub fn table(&self) -> &CapabilityTable {
        &self.table
    }

    /// Whether `patch` applies to this environment
    #[inline]
    #[must_use]
    pub fn is_applicable(&self, patch: &str) -> bool {
        self.evaluate(patch).is_applicable()
    }

    /// Detailed verdict for `patch`, computed on first request
    ///
    /// The rule is assessed while holding the memo entry, so concurrent
    /// callers wait for one assessment. A rule's probe must not query the
    /// detector.
    pub fn evaluate(&self, patch: &str) -> Applicability {
        if let Some(verdict) = self.verdicts.get(patch) {
            return verdict.clone();
        }

        self.verdicts
            .entry(patch.to_string())
            .or_insert_with(|| {
                let verdict = match self.table.get(patch) {
                    Some(rule) => self.assess(rule),
                    None => Applicability::Inconclusive("no capability rule registered".to_string()),
                };
                if let Applicability::Inconclusive(reason) = &verdict {
                    tracing::info!(patch, %reason, "capability detection inconclusive, treating as not applicable");
                }
                verdict
            })
            .clone()
    }

    /// Number of patches assessed so far
    #[inline]
    #[must_use]
    pub fn evaluated_count(&self) -> usize {
        self.verdicts.len()
    }

    fn assess(&self, rule: &CapabilityRule) -> Applicability {
        if let Some(range) = rule.version {
            let Some(version) = self.environment.framework_version() else {
                return Applicability::Inconclusive("framework version unknown".to_string());
            };
            if !range.contains(version) {
                return Applicability::NotApplicable(format!(
                    "framework {version} outside {range}"
                ));
            }
        }

        if let Some(backend) = &rule.backend {
            let connections = self.environment.connections().connections();
            if connections.is_empty() {
                return Applicability::Inconclusive("no connections configured".to_string());
            }
            if !connections.iter().any(|c| &c.backend == backend) {
                return Applicability::NotApplicable(format!("no connection uses {backend}"));
            }
        }

        if let Some(probe) = &rule.probe {
            match probe() {
                ProbeOutcome::Positive => {}
                ProbeOutcome::Negative => {
                    return Applicability::NotApplicable("probe found no defect".to_string());
                }
                ProbeOutcome::Inconclusive(reason) => return Applicability::Inconclusive(reason),
            }
        }

        Applicability::Applicable
    }
}
