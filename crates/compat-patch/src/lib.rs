//! Compat Patch
//!
//! Startup-time behavior patches for persistence framework objects.
//!
//! # Core Concepts
//!
//! - [`Slot`]: named extension point holding a shared behavior; patches
//!   capture it, wrap it, and rebind it
//! - [`FrameworkTargets`]: the framework objects that expose slots (geometry
//!   adapter, field ordering, model options)
//! - [`Patch`]: catalog entry pairing a capability rule with a rewrite
//! - [`PatchRegistry`]: applies the catalog once, guarded by per-target
//!   idempotency markers
//!
//! # Catalog
//!
//! | patch | applies when |
//! |---|---|
//! | [`GeometryEscapePatch`] | framework < 1.4 with a PostGIS connection |
//! | [`FieldOrderingPatch`] | comparing a field with null fails |
//! | [`VerboseNameTruncationPatch`] | always |
//!
//! # Example
//!
//! ```rust,ignore
//! use compat_patch::{FrameworkTargets, PatchRegistry};
//!
//! let targets = Arc::new(FrameworkTargets::stock());
//! let registry = PatchRegistry::new(Arc::clone(&targets), environment);
//! let report = registry.apply_all();
//! for failure in report.failures() {
//!     eprintln!("{}: {:?}", failure.patch, failure.outcome);
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod catalog;
mod patch;
mod registry;
mod slot;
pub mod targets;

pub use catalog::{
    creation_order, default_catalog, FieldOrderingPatch, GeometryEscapePatch,
    VerboseNameTruncationPatch, GEOMETRY_ESCAPE_FIXED_IN,
};
pub use patch::{Patch, PatchError, PatchOutcome};
pub use registry::{PatchReport, PatchReportEntry, PatchRegistry};
pub use slot::{PatchMarkers, Slot};
pub use targets::{FrameworkTargets, PatchTarget};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
