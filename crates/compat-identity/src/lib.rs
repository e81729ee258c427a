//! Compat Identity
//!
//! Canonical identity records for model types.
//!
//! # Core Concepts
//!
//! - [`IdentityResolver`]: reduces a descriptor to its concrete model and
//!   returns that model's identity record, so proxies never get an identity
//!   of their own
//! - [`IdentityStore`]: async backing store; owns at-most-one-create per key
//! - [`IdentityCache`]: per-route moka caches in front of the store
//!
//! # Resolution order
//!
//! 1. Deferred descriptors become the model they shadow; proxies become their
//!    concrete target (one hop only)
//! 2. The route's cache is consulted
//! 3. Proxies try [`IdentityStore::get_for_model_exact`]; when the store
//!    answers [`Lookup::Unsupported`] they fall back to `get_or_create` with
//!    the truncated display name, re-fetching if a concurrent create won
//! 4. Concrete models use [`IdentityStore::get_for_model`]
//! 5. The result is cached for the route

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod cache;
mod error;
mod key;
mod resolver;
mod store;

pub use cache::{CacheStats, IdentityCache};
pub use error::UnresolvedIdentityError;
pub use key::{IdentityKey, IdentityRecord, StorageRoute};
pub use resolver::{DisplayNameFn, IdentityResolver};
pub use store::{IdentityStore, Lookup, StoreError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
