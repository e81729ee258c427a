//! The fixed patch catalog

use crate::patch::{Patch, PatchError};
use crate::targets::{
    AdapterState, BinaryParam, Comparand, Comparison, FrameworkTargets, PatchTarget,
};
use compat_detect::{
    BackendKind, CapabilityRule, ConnectionInfo, FrameworkVersion, ProbeOutcome, VersionRange,
};
use compat_model::{truncate_display_name, ModelDescriptor};
use std::cmp::Ordering;
use std::sync::Arc;

/// First framework release that escapes geometry payloads correctly
pub const GEOMETRY_ESCAPE_FIXED_IN: FrameworkVersion = FrameworkVersion::new(1, 4, 0);

/// Carry geometry payloads as binary parameters instead of inline literals
///
/// Affected: PostGIS connections on frameworks before
/// [`GEOMETRY_ESCAPE_FIXED_IN`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryEscapePatch;

impl GeometryEscapePatch {
    /// Catalog name
    pub const NAME: &'static str = "geometry_adapter_binary_escape";
}

impl Patch for GeometryEscapePatch {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn target<'t>(&self, targets: &'t FrameworkTargets) -> &'t dyn PatchTarget {
        &targets.geometry_adapter
    }

    fn capability(&self, _targets: &Arc<FrameworkTargets>) -> CapabilityRule {
        CapabilityRule::new()
            .with_version(VersionRange::below(GEOMETRY_ESCAPE_FIXED_IN))
            .on_backend(BackendKind::PostGis)
    }

    fn apply(&self, targets: &FrameworkTargets) -> Result<(), PatchError> {
        let adapter = &targets.geometry_adapter;

        let init = adapter.init.current();
        adapter.init.rebind(Arc::new(move |state: &mut AdapterState| {
            init(&mut *state);
            state.binary = Some(BinaryParam::new(state.ewkb.clone()));
        }));

        adapter
            .prepare
            .rebind(Arc::new(|state: &mut AdapterState, connection: &ConnectionInfo| {
                if let Some(binary) = state.binary.as_mut() {
                    binary.prepare(connection);
                }
            }));

        adapter.quote.rebind(Arc::new(|state: &AdapterState| {
            let param = match &state.binary {
                Some(binary) => binary.quoted(),
                None => BinaryParam::new(state.ewkb.clone()).quoted(),
            };
            format!("ST_GeomFromEWKB({param})")
        }));

        Ok(())
    }
}

/// Make the field ordering operator total over foreign operands
///
/// Affected: any framework whose operator fails when a field is compared
/// with null, as reported by the startup probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldOrderingPatch;

impl FieldOrderingPatch {
    /// Catalog name
    pub const NAME: &'static str = "field_ordering_protocol";
}

impl Patch for FieldOrderingPatch {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn target<'t>(&self, targets: &'t FrameworkTargets) -> &'t dyn PatchTarget {
        &targets.field
    }

    fn capability(&self, targets: &Arc<FrameworkTargets>) -> CapabilityRule {
        let targets = Arc::clone(targets);
        CapabilityRule::new().with_probe(move || targets.field.probe_null_comparison())
    }

    fn apply(&self, targets: &FrameworkTargets) -> Result<(), PatchError> {
        targets.field.compare.rebind(Arc::new(creation_order));

        match targets.field.probe_null_comparison() {
            ProbeOutcome::Negative => Ok(()),
            outcome => Err(PatchError::verification_failed(
                Self::NAME,
                format!("null comparison still reports {outcome:?}"),
            )),
        }
    }
}

/// Ordering by creation sequence; anything that is not a field is not comparable
pub fn creation_order(lhs: Comparand<'_>, rhs: Comparand<'_>) -> Comparison {
    match (lhs, rhs) {
        (Comparand::Field(a), Comparand::Field(b)) => {
            Ok(Some(a.creation_counter().cmp(&b.creation_counter())))
        }
        _ => Ok(None),
    }
}

/// Keep derived display names under the identity schema limit
#[derive(Debug, Clone, Copy, Default)]
pub struct VerboseNameTruncationPatch;

impl VerboseNameTruncationPatch {
    /// Catalog name
    pub const NAME: &'static str = "verbose_name_truncation";
}

impl Patch for VerboseNameTruncationPatch {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn target<'t>(&self, targets: &'t FrameworkTargets) -> &'t dyn PatchTarget {
        &targets.options
    }

    fn capability(&self, _targets: &Arc<FrameworkTargets>) -> CapabilityRule {
        CapabilityRule::new()
    }

    fn apply(&self, targets: &FrameworkTargets) -> Result<(), PatchError> {
        let original = targets.options.verbose_name_raw.current();
        targets
            .options
            .verbose_name_raw
            .rebind(Arc::new(move |model: &ModelDescriptor| {
                truncate_display_name(&original(model)).into_owned()
            }));
        Ok(())
    }
}

/// The built-in catalog, in application order
#[must_use]
pub fn default_catalog() -> Vec<Box<dyn Patch>> {
    vec![
        Box::new(GeometryEscapePatch),
        Box::new(FieldOrderingPatch),
        Box::new(VerboseNameTruncationPatch),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_patch_binds_binary_param() {
        let targets = FrameworkTargets::stock();
        GeometryEscapePatch.apply(&targets).unwrap();

        let mut adapter = targets.geometry_adapter.adapt(vec![0x01, 0x5c, 0x27]);
        adapter.prepare(&ConnectionInfo::new("gis", BackendKind::PostGis));

        let binary = adapter.state().binary.as_ref().unwrap();
        assert_eq!(binary.prepared_for(), Some("gis"));
        assert_eq!(adapter.quoted(), "ST_GeomFromEWKB('\\x015c27'::bytea)");
    }

    #[test]
    fn geometry_patch_keeps_original_init() {
        let targets = FrameworkTargets::stock();
        targets
            .geometry_adapter
            .init
            .rebind(Arc::new(|state: &mut AdapterState| state.ewkb.push(0xaa)));

        GeometryEscapePatch.apply(&targets).unwrap();
        let adapter = targets.geometry_adapter.adapt(vec![0x01]);

        assert_eq!(adapter.state().ewkb, vec![0x01, 0xaa]);
        assert_eq!(adapter.state().binary, Some(BinaryParam::new(vec![0x01, 0xaa])));
    }

    #[test]
    fn field_patch_verifies_probe() {
        let targets = FrameworkTargets::stock();
        assert_eq!(FieldOrderingPatch.apply(&targets), Ok(()));
        assert_eq!(targets.field.probe_null_comparison(), ProbeOutcome::Negative);
    }

    #[test]
    fn creation_order_rejects_foreign_operands() {
        let targets = FrameworkTargets::stock();
        let a = targets.field.new_field("a");
        let other = 42_u32;

        assert_eq!(creation_order(Comparand::Field(&a), Comparand::Null), Ok(None));
        assert_eq!(creation_order(Comparand::Other(&other), Comparand::Field(&a)), Ok(None));
        assert_eq!(creation_order(Comparand::Null, Comparand::Other(&other)), Ok(None));
        assert_eq!(
            creation_order(Comparand::Field(&a), Comparand::Field(&a)),
            Ok(Some(Ordering::Equal))
        );
    }

    #[test]
    fn truncation_wraps_original_accessor() {
        let targets = FrameworkTargets::stock();
        targets
            .options
            .verbose_name_raw
            .rebind(Arc::new(|model: &ModelDescriptor| format!("{} of many words", model.verbose_name())));

        VerboseNameTruncationPatch.apply(&targets).unwrap();
        let model = ModelDescriptor::concrete("blog", "ExtraordinarilyLongArticleName");

        let name = targets.options.verbose_name_raw(&model);
        assert_eq!(name, "extraordinarily long article name of...");
        assert_eq!(name.chars().count(), 39);
    }

    #[test]
    fn catalog_names_are_unique() {
        let catalog = default_catalog();
        let mut names: Vec<_> = catalog.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }
}
