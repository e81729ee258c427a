//! Patch registry
//!
//! Provides [`PatchRegistry`], which runs the catalog against the framework
//! targets once detection has ruled on each patch.

use crate::catalog::default_catalog;
use crate::patch::{Patch, PatchOutcome};
use crate::targets::FrameworkTargets;
use compat_detect::{Applicability, CapabilityDetector, CapabilityTable, Environment};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Applies the catalog to a set of framework targets
///
/// `apply_all` is an initialization barrier: run it to completion before
/// anything reads the patched targets. Repeated calls are no-ops for patches
/// already in effect, and a patch that was ruled out or failed is not
/// reconsidered.
#[derive(Debug)]
pub struct PatchRegistry {
    targets: Arc<FrameworkTargets>,
    detector: CapabilityDetector,
    catalog: Vec<Box<dyn Patch>>,
    settled: Mutex<IndexMap<&'static str, PatchOutcome>>,
}

impl PatchRegistry {
    /// Registry over the built-in catalog
    #[must_use]
    pub fn new(targets: Arc<FrameworkTargets>, environment: Environment) -> Self {
        Self::with_catalog(targets, environment, default_catalog())
    }

    /// Registry over an explicit catalog
    #[must_use]
    pub fn with_catalog(
        targets: Arc<FrameworkTargets>,
        environment: Environment,
        catalog: Vec<Box<dyn Patch>>,
    ) -> Self {
        let mut table = CapabilityTable::new();
        for patch in &catalog {
            table.insert(patch.name(), patch.capability(&targets));
        }

        Self {
            targets,
            detector: CapabilityDetector::new(environment, table),
            catalog,
            settled: Mutex::new(IndexMap::new()),
        }
    }

    /// Framework targets this registry patches
    #[inline]
    #[must_use]
    pub fn targets(&self) -> &Arc<FrameworkTargets> {
        &self.targets
    }

    /// Detector deciding applicability
    #[inline]
    #[must_use]
    pub fn detector(&self) -> &CapabilityDetector {
        &self.detector
    }

    /// Catalog names in application order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.catalog.iter().map(|p| p.name()).collect()
    }

    /// Apply every applicable patch that is not yet in effect
    ///
    /// Failures are contained: a failing patch is logged, reported and
    /// skipped, and the remaining patches still run.
    pub fn apply_all(&self) -> PatchReport {
        let mut settled = self.settled.lock();
        let mut report = PatchReport::default();

        for patch in &self.catalog {
            let name = patch.name();

            let outcome = if patch.is_applied(&self.targets) {
                PatchOutcome::AlreadyApplied
            } else if let Some(previous) = settled.get(name) {
                previous.clone()
            } else {
                let outcome = self.run(patch.as_ref());
                settled.insert(name, outcome.clone());
                outcome
            };

            report.entries.push(PatchReportEntry {
                patch: name,
                outcome,
            });
        }

        tracing::debug!(
            applied = report.applied().len(),
            total = report.len(),
            "patch registry run complete"
        );
        report
    }

    fn run(&self, patch: &dyn Patch) -> PatchOutcome {
        let name = patch.name();

        match self.detector.evaluate(name) {
            Applicability::Applicable => {}
            Applicability::NotApplicable(reason) => {
                tracing::debug!(patch = name, %reason, "patch not applicable");
                return PatchOutcome::NotApplicable { reason };
            }
            Applicability::Inconclusive(reason) => {
                return PatchOutcome::Inconclusive { reason };
            }
        }

        match patch.apply(&self.targets) {
            Ok(()) => {
                let target = patch.target(&self.targets);
                target.markers().record(patch.marker());
                tracing::info!(patch = name, target = target.target_name(), "patch applied");
                PatchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(patch = name, error = %e, "patch failed, skipping");
                PatchOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Outcome of one patch in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReportEntry {
    /// Patch name
    pub patch: &'static str,
    /// What happened
    #[serde(flatten)]
    pub outcome: PatchOutcome,
}

/// Per-patch outcomes of one `apply_all` run, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    entries: Vec<PatchReportEntry>,
}

impl PatchReport {
    /// All entries
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[PatchReportEntry] {
        &self.entries
    }

    /// Outcome for `patch`
    #[must_use]
    pub fn outcome(&self, patch: &str) -> Option<&PatchOutcome> {
        self.entries
            .iter()
            .find(|e| e.patch == patch)
            .map(|e| &e.outcome)
    }

    /// Patches applied during this run
    #[must_use]
    pub fn applied(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| e.outcome == PatchOutcome::Applied)
            .map(|e| e.patch)
            .collect()
    }

    /// Patches that failed
    #[must_use]
    pub fn failures(&self) -> Vec<&PatchReportEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, PatchOutcome::Failed { .. }))
            .collect()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if report is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldOrderingPatch, GeometryEscapePatch, VerboseNameTruncationPatch};
    use crate::targets::PatchTarget;
    use compat_detect::{BackendKind, ConnectionInfo, StaticConnections};
    use pretty_assertions::assert_eq;

    fn environment(version: &str, backends: &[BackendKind]) -> Environment {
        let connections = backends
            .iter()
            .map(|b| ConnectionInfo::new(b.to_string(), b.clone()))
            .collect();
        Environment::new(
            Some(version.parse().unwrap()),
            Arc::new(StaticConnections::new(connections)),
        )
    }

    #[test]
    fn legacy_postgis_applies_everything() {
        let targets = Arc::new(FrameworkTargets::stock());
        let registry = PatchRegistry::new(Arc::clone(&targets), environment("1.3.7", &[BackendKind::PostGis]));

        let report = registry.apply_all();
        assert_eq!(
            report.applied(),
            vec![
                GeometryEscapePatch::NAME,
                FieldOrderingPatch::NAME,
                VerboseNameTruncationPatch::NAME
            ]
        );
        assert_eq!(targets.geometry_adapter.markers().list(), vec![GeometryEscapePatch::NAME]);
    }

    #[test]
    fn modern_sqlite_skips_geometry() {
        let targets = Arc::new(FrameworkTargets::stock());
        let registry = PatchRegistry::new(targets, environment("1.6", &[BackendKind::Sqlite]));

        let report = registry.apply_all();
        assert!(matches!(
            report.outcome(GeometryEscapePatch::NAME),
            Some(PatchOutcome::NotApplicable { .. })
        ));
        assert_eq!(report.outcome(VerboseNameTruncationPatch::NAME), Some(&PatchOutcome::Applied));
    }

    #[test]
    fn second_run_reports_already_applied() {
        let targets = Arc::new(FrameworkTargets::stock());
        let registry = PatchRegistry::new(targets, environment("1.3", &[BackendKind::PostGis]));

        registry.apply_all();
        let second = registry.apply_all();

        assert!(second.applied().is_empty());
        assert!(second
            .entries()
            .iter()
            .all(|e| e.outcome == PatchOutcome::AlreadyApplied));
    }

    #[test]
    fn report_serializes_flat() {
        let targets = Arc::new(FrameworkTargets::stock());
        let registry = PatchRegistry::new(targets, environment("1.6", &[BackendKind::Sqlite]));
        let report = registry.apply_all();

        let json = serde_json::to_value(&report).unwrap();
        let first = &json["entries"][0];
        assert_eq!(first["patch"], GeometryEscapePatch::NAME);
        assert_eq!(first["outcome"], "not_applicable");
        assert!(first["reason"].as_str().unwrap().contains("1.6.0"));
    }
}
