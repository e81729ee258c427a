//! Compat Model
//!
//! The slice of the persistence framework's metadata API the compatibility
//! layer reads: model descriptors and display-name rules.
//!
//! - [`ModelDescriptor`]: namespace, object name and storage relationship
//! - [`truncate_display_name`]: the display-name length rule shared by the
//!   verbose-name patch and the identity resolver

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod descriptor;
pub mod naming;

pub use descriptor::{ModelDescriptor, ModelKind};
pub use naming::{camel_case_to_spaces, truncate_display_name, DISPLAY_NAME_LIMIT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
