//! Compat Core
//!
//! Startup facade for the ORM compatibility layer.
//!
//! # Startup
//!
//! 1. Load a [`CompatConfig`] (TOML or JSON)
//! 2. Install logging with [`logging::init_from_config`]
//! 3. Run [`CompatLayer::initialize`] over the framework targets; this
//!    detects applicability and applies the patch catalog exactly once
//! 4. Build an identity resolver with [`CompatLayer::resolver`]
//!
//! # Example
//!
//! ```rust,ignore
//! use compat_core::{logging, CompatConfig, CompatLayer};
//! use compat_patch::FrameworkTargets;
//!
//! let config = CompatConfig::from_path("compat.toml")?;
//! logging::init_from_config(&config)?;
//!
//! let layer = CompatLayer::initialize(config, Arc::new(FrameworkTargets::stock()))?;
//! let resolver = layer.resolver(store);
//! let record = resolver.resolve(&model, None).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod error;
mod layer;
pub mod logging;

pub use config::{CompatConfig, ConfigError, ConnectionConfig, IdentityConfig, LogFormat};
pub use error::CompatError;
pub use layer::CompatLayer;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
