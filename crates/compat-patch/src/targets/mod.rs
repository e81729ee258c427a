//! Framework objects the registry may patch

mod field;
mod geometry;
mod options;

pub use field::{CompareBehavior, CompareError, Comparand, Comparison, Field, FieldClass};
pub use geometry::{
    AdapterState, BinaryParam, GeometryAdapter, GeometryAdapterClass, InitBehavior,
    PrepareBehavior, QuoteBehavior,
};
pub use options::{OptionsClass, VerboseNameBehavior};

use crate::slot::PatchMarkers;

/// A shared framework object carrying idempotency markers
pub trait PatchTarget: Send + Sync {
    /// Name used in logs and reports
    fn target_name(&self) -> &'static str;

    /// Markers recorded on this object
    fn markers(&self) -> &PatchMarkers;
}

/// Every patchable object of one framework instance
#[derive(Debug, Default)]
pub struct FrameworkTargets {
    /// Spatial geometry adapter
    pub geometry_adapter: GeometryAdapterClass,
    /// Metadata field class
    pub field: FieldClass,
    /// Model options accessor
    pub options: OptionsClass,
}

impl FrameworkTargets {
    /// Targets with stock framework behavior
    #[must_use]
    pub fn stock() -> Self {
        Self::default()
    }
}
