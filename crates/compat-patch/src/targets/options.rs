//! Model options accessor
//!
//! Exposes the raw display name the framework derives for each model; the
//! identity store persists it alongside the model's identity.

use crate::slot::{PatchMarkers, Slot};
use crate::targets::PatchTarget;
use compat_model::ModelDescriptor;
use std::sync::Arc;

/// Raw display-name accessor hook
pub type VerboseNameBehavior = dyn Fn(&ModelDescriptor) -> String + Send + Sync;

/// Options class shared by every model
#[derive(Debug)]
pub struct OptionsClass {
    /// Raw display-name accessor
    pub verbose_name_raw: Slot<VerboseNameBehavior>,
    markers: PatchMarkers,
}

impl OptionsClass {
    /// Options with the stock, untruncated accessor
    #[must_use]
    pub fn stock() -> Self {
        Self {
            verbose_name_raw: Slot::new(
                "verbose_name_raw",
                Arc::new(|model: &ModelDescriptor| model.verbose_name().into_owned()),
            ),
            markers: PatchMarkers::new(),
        }
    }

    /// Raw display name for `model`
    #[must_use]
    pub fn verbose_name_raw(&self, model: &ModelDescriptor) -> String {
        (self.verbose_name_raw.current())(model)
    }
}

impl Default for OptionsClass {
    fn default() -> Self {
        Self::stock()
    }
}

impl PatchTarget for OptionsClass {
    fn target_name(&self) -> &'static str {
        "options"
    }

    fn markers(&self) -> &PatchMarkers {
        &self.markers
    }
}
