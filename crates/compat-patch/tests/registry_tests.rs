use compat_detect::{BackendKind, CapabilityRule, ConnectionInfo, Environment, StaticConnections};
use compat_model::ModelDescriptor;
use compat_patch::targets::Comparand;
use compat_patch::{
    FieldOrderingPatch, FrameworkTargets, GeometryEscapePatch, Patch, PatchError, PatchOutcome,
    PatchRegistry, PatchTarget, VerboseNameTruncationPatch,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

fn environment(version: Option<&str>, backends: &[BackendKind]) -> Environment {
    let connections = backends
        .iter()
        .enumerate()
        .map(|(i, b)| ConnectionInfo::new(format!("db{i}"), b.clone()))
        .collect();
    Environment::new(
        version.map(|v| v.parse().unwrap()),
        Arc::new(StaticConnections::new(connections)),
    )
}

fn legacy_postgis() -> Environment {
    environment(Some("1.3.7"), &[BackendKind::PostGis])
}

#[test]
fn repeated_apply_all_does_not_rewrap() {
    let targets = Arc::new(FrameworkTargets::stock());
    let registry = PatchRegistry::new(Arc::clone(&targets), legacy_postgis());

    registry.apply_all();
    let init = targets.geometry_adapter.init.current();
    let quote = targets.geometry_adapter.quote.current();
    let compare = targets.field.compare.current();
    let verbose = targets.options.verbose_name_raw.current();

    for _ in 0..5 {
        let report = registry.apply_all();
        assert!(report.applied().is_empty());
    }

    assert!(targets.geometry_adapter.init.is_bound_to(&init));
    assert!(targets.geometry_adapter.quote.is_bound_to(&quote));
    assert!(targets.field.compare.is_bound_to(&compare));
    assert!(targets.options.verbose_name_raw.is_bound_to(&verbose));
}

#[test]
fn second_registry_on_same_targets_is_noop() {
    let targets = Arc::new(FrameworkTargets::stock());
    PatchRegistry::new(Arc::clone(&targets), legacy_postgis()).apply_all();
    let verbose = targets.options.verbose_name_raw.current();

    let again = PatchRegistry::new(Arc::clone(&targets), legacy_postgis()).apply_all();

    assert!(again
        .entries()
        .iter()
        .all(|e| e.outcome == PatchOutcome::AlreadyApplied));
    assert!(targets.options.verbose_name_raw.is_bound_to(&verbose));

    let model = ModelDescriptor::concrete("blog", "Article").with_verbose_name("x".repeat(50));
    assert_eq!(
        targets.options.verbose_name_raw(&model),
        format!("{}...", "x".repeat(36))
    );
}

#[test]
fn inapplicable_patch_leaves_slots_untouched() {
    let targets = Arc::new(FrameworkTargets::stock());
    let init = targets.geometry_adapter.init.current();
    let prepare = targets.geometry_adapter.prepare.current();
    let quote = targets.geometry_adapter.quote.current();

    let registry = PatchRegistry::new(
        Arc::clone(&targets),
        environment(Some("1.4.2"), &[BackendKind::PostGis]),
    );
    let report = registry.apply_all();

    assert!(matches!(
        report.outcome(GeometryEscapePatch::NAME),
        Some(PatchOutcome::NotApplicable { .. })
    ));
    assert!(targets.geometry_adapter.init.is_bound_to(&init));
    assert!(targets.geometry_adapter.prepare.is_bound_to(&prepare));
    assert!(targets.geometry_adapter.quote.is_bound_to(&quote));
    assert!(targets.geometry_adapter.markers().list().is_empty());

    let adapter = targets.geometry_adapter.adapt(vec![0x01]);
    assert!(adapter.quoted().starts_with("ST_GeomFromEWKB(E'"));
}

#[test]
fn missing_connections_are_inconclusive() {
    let targets = Arc::new(FrameworkTargets::stock());
    let registry = PatchRegistry::new(Arc::clone(&targets), environment(Some("1.3"), &[]));

    let report = registry.apply_all();
    assert!(matches!(
        report.outcome(GeometryEscapePatch::NAME),
        Some(PatchOutcome::Inconclusive { .. })
    ));
    assert_eq!(report.outcome(FieldOrderingPatch::NAME), Some(&PatchOutcome::Applied));
}

#[test]
fn field_ordering_skipped_when_operator_already_total() {
    let targets = Arc::new(FrameworkTargets::stock());
    targets
        .field
        .compare
        .rebind(Arc::new(compat_patch::creation_order));
    let compare = targets.field.compare.current();

    let report = PatchRegistry::new(Arc::clone(&targets), legacy_postgis()).apply_all();

    assert!(matches!(
        report.outcome(FieldOrderingPatch::NAME),
        Some(PatchOutcome::NotApplicable { .. })
    ));
    assert!(targets.field.compare.is_bound_to(&compare));
}

#[derive(Debug)]
struct BrokenPatch {
    attempts: Arc<AtomicUsize>,
}

impl Patch for BrokenPatch {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn target<'t>(&self, targets: &'t FrameworkTargets) -> &'t dyn PatchTarget {
        &targets.options
    }

    fn capability(&self, _targets: &Arc<FrameworkTargets>) -> CapabilityRule {
        CapabilityRule::new()
    }

    fn apply(&self, _targets: &FrameworkTargets) -> Result<(), PatchError> {
        self.attempts.fetch_add(1, AtomicOrdering::SeqCst);
        Err(PatchError::verification_failed("broken", "always"))
    }
}

#[test]
fn failing_patch_is_contained_and_not_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let targets = Arc::new(FrameworkTargets::stock());
    let catalog: Vec<Box<dyn Patch>> = vec![
        Box::new(BrokenPatch {
            attempts: Arc::clone(&attempts),
        }),
        Box::new(VerboseNameTruncationPatch),
    ];
    let registry = PatchRegistry::with_catalog(Arc::clone(&targets), legacy_postgis(), catalog);

    let first = registry.apply_all();
    let second = registry.apply_all();

    assert_eq!(first.failures().len(), 1);
    assert_eq!(first.outcome(VerboseNameTruncationPatch::NAME), Some(&PatchOutcome::Applied));
    assert_eq!(second.failures().len(), 1);
    assert_eq!(attempts.load(AtomicOrdering::SeqCst), 1);
    assert!(!targets.options.markers().contains("broken"));
}

#[test]
fn patched_fields_sort_among_foreign_values() {
    let targets = Arc::new(FrameworkTargets::stock());
    PatchRegistry::new(Arc::clone(&targets), legacy_postgis()).apply_all();

    let field = targets.field.new_field("title");
    assert_eq!(targets.field.compare(Comparand::Field(&field), Comparand::Null), Ok(None));
    assert_eq!(targets.field.lt(Comparand::Null, Comparand::Field(&field)), Ok(false));
}

proptest! {
    #[test]
    fn prop_patched_ordering_follows_creation(count in 2usize..20, picks in proptest::collection::vec((0usize..20, 0usize..20), 1..40)) {
        let targets = Arc::new(FrameworkTargets::stock());
        PatchRegistry::new(Arc::clone(&targets), legacy_postgis()).apply_all();
        let fields: Vec<_> = (0..count).map(|i| targets.field.new_field(format!("f{i}"))).collect();

        for (i, j) in picks {
            let (a, b) = (&fields[i % count], &fields[j % count]);
            let expected = (i % count).cmp(&(j % count));
            prop_assert_eq!(
                targets.field.compare(Comparand::Field(a), Comparand::Field(b)),
                Ok(Some(expected))
            );
        }
    }

    #[test]
    fn prop_foreign_operands_not_comparable(n in any::<i64>(), s in "\\PC{0,10}") {
        let targets = Arc::new(FrameworkTargets::stock());
        PatchRegistry::new(Arc::clone(&targets), legacy_postgis()).apply_all();

        let result = targets.field.compare(Comparand::Other(&n), Comparand::Other(&s));
        prop_assert_eq!(result, Ok(None));
    }

    #[test]
    fn prop_patched_accessor_truncates(name in "[a-z ]{0,80}") {
        let targets = Arc::new(FrameworkTargets::stock());
        PatchRegistry::new(Arc::clone(&targets), environment(None, &[])).apply_all();

        let model = ModelDescriptor::concrete("blog", "Article").with_verbose_name(name.clone());
        let out = targets.options.verbose_name_raw(&model);

        prop_assert!(out.chars().count() <= 39);
        if name.chars().count() >= 40 {
            prop_assert!(out.ends_with("..."));
            prop_assert_eq!(&out[..36], &name[..36]);
        } else {
            prop_assert_eq!(out, name);
        }
    }
}
