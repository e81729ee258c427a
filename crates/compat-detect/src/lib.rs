//! Compat Detect
//!
//! Decides which compatibility patches the running framework needs.
//!
//! # Core Concepts
//!
//! - [`CapabilityTable`]: patch name → [`CapabilityRule`] (version range,
//!   backend, startup probe)
//! - [`Environment`]: declared framework version plus a
//!   [`ConnectionRegistry`]
//! - [`CapabilityDetector`]: evaluates each rule once and memoizes the
//!   [`Applicability`] verdict
//!
//! Detection is conservative: a missing signal yields
//! [`Applicability::Inconclusive`], which never applies a patch.
//!
//! # Example
//!
//! ```rust,ignore
//! use compat_detect::*;
//!
//! let table = CapabilityTable::new().with_rule(
//!     "geometry_adapter_binary_escape",
//!     CapabilityRule::new()
//!         .with_version(VersionRange::below(FrameworkVersion::new(1, 4, 0)))
//!         .on_backend(BackendKind::PostGis),
//! );
//! let env = Environment::new(Some("1.3.7".parse()?), Arc::new(StaticConnections::empty()));
//! let detector = CapabilityDetector::new(env, table);
//! assert!(!detector.is_applicable("geometry_adapter_binary_escape"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod backend;
mod capability;
mod detector;
mod version;

pub use backend::{BackendKind, ConnectionInfo, ConnectionRegistry, StaticConnections};
pub use capability::{Applicability, CapabilityRule, CapabilityTable, Probe, ProbeOutcome};
pub use detector::{CapabilityDetector, Environment};
pub use version::{FrameworkVersion, VersionParseError, VersionRange};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
