//! Patch trait and outcomes

use crate::targets::{FrameworkTargets, PatchTarget};
use compat_detect::CapabilityRule;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// One entry of the patch catalog
///
/// `apply` follows the rewrite protocol: capture the target's current
/// behavior, build a replacement that wraps or replaces it, and rebind the
/// slot. The registry records [`marker`](Patch::marker) on the target once
/// `apply` succeeds.
pub trait Patch: Send + Sync + fmt::Debug {
    /// Unique patch name, also the capability table key
    fn name(&self) -> &'static str;

    /// Idempotency marker recorded on the target
    fn marker(&self) -> &'static str {
        self.name()
    }

    /// Object this patch rewrites
    fn target<'t>(&self, targets: &'t FrameworkTargets) -> &'t dyn PatchTarget;

    /// Conditions under which the patch applies
    fn capability(&self, targets: &Arc<FrameworkTargets>) -> CapabilityRule;

    /// Rewrite the target's behavior
    ///
    /// # Errors
    /// Returns [`PatchError`] when the rewritten behavior fails verification
    fn apply(&self, targets: &FrameworkTargets) -> Result<(), PatchError>;

    /// Whether the target already carries this patch's marker
    fn is_applied(&self, targets: &FrameworkTargets) -> bool {
        self.target(targets).markers().contains(self.marker())
    }
}

/// Errors raised while applying a patch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// The patched behavior still shows the defect
    #[error("patch '{patch}' verification failed: {reason}")]
    VerificationFailed {
        /// Patch name
        patch: &'static str,
        /// What was observed
        reason: String,
    },
}

impl PatchError {
    /// Create verification failure
    pub fn verification_failed(patch: &'static str, reason: impl Into<String>) -> Self {
        Self::VerificationFailed {
            patch,
            reason: reason.into(),
        }
    }
}

/// What happened to a patch during one `apply_all` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// Applied during this run
    Applied,
    /// Target already carried the marker
    AlreadyApplied,
    /// Detection ruled the patch out
    NotApplicable {
        /// Detection reason
        reason: String,
    },
    /// Detection lacked a signal
    Inconclusive {
        /// Detection reason
        reason: String,
    },
    /// Application failed; the patch is skipped for the rest of the process
    Failed {
        /// Rendered error
        error: String,
    },
}

impl PatchOutcome {
    /// Whether the patch is in effect after this run
    #[inline]
    #[must_use]
    pub fn is_in_effect(&self) -> bool {
        matches!(self, Self::Applied | Self::AlreadyApplied)
    }
}
