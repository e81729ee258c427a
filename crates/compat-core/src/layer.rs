//! Startup facade
//!
//! [`CompatLayer`] owns the patch registry for one set of framework targets
//! and runs it exactly once before anything reads the targets or resolves
//! identities.

use crate::config::CompatConfig;
use crate::error::CompatError;
use compat_identity::{IdentityCache, IdentityResolver, IdentityStore};
use compat_model::ModelDescriptor;
use compat_patch::{FrameworkTargets, PatchRegistry, PatchReport};
use once_cell::sync::OnceCell;
use std::sync::Arc;

static GLOBAL: OnceCell<CompatLayer> = OnceCell::new();

/// Compatibility layer over one set of framework targets
#[derive(Debug)]
pub struct CompatLayer {
    config: CompatConfig,
    registry: PatchRegistry,
    report: OnceCell<PatchReport>,
}

impl CompatLayer {
    /// Build the layer without applying patches
    ///
    /// # Errors
    /// Returns [`CompatError::Config`] if the configured version does not parse
    pub fn new(config: CompatConfig, targets: Arc<FrameworkTargets>) -> Result<Self, CompatError> {
        let environment = config.environment()?;
        Ok(Self {
            registry: PatchRegistry::new(targets, environment),
            config,
            report: OnceCell::new(),
        })
    }

    /// Build the layer and apply the catalog
    ///
    /// # Errors
    /// Returns [`CompatError::Config`] if the configured version does not parse
    pub fn initialize(config: CompatConfig, targets: Arc<FrameworkTargets>) -> Result<Self, CompatError> {
        let layer = Self::new(config, targets)?;
        layer.ensure_initialized();
        Ok(layer)
    }

    /// Install the process-wide layer
    ///
    /// The first call builds and initializes the layer; later calls return
    /// it unchanged and ignore their arguments.
    ///
    /// # Errors
    /// Returns [`CompatError::Config`] if the first call's configuration is invalid
    pub fn install(
        config: CompatConfig,
        targets: Arc<FrameworkTargets>,
    ) -> Result<&'static CompatLayer, CompatError> {
        GLOBAL.get_or_try_init(|| Self::initialize(config, targets))
    }

    /// The process-wide layer, if installed
    #[inline]
    #[must_use]
    pub fn global() -> Option<&'static CompatLayer> {
        GLOBAL.get()
    }

    /// Apply the catalog if that has not happened yet
    ///
    /// Blocks concurrent callers until the first run completes.
    pub fn ensure_initialized(&self) -> &PatchReport {
        self.report.get_or_init(|| {
            let report = self.registry.apply_all();
            tracing::info!(
                applied = ?report.applied(),
                failed = report.failures().len(),
                "compatibility patches initialized"
            );
            report
        })
    }

    /// Report from initialization, if it has run
    #[inline]
    #[must_use]
    pub fn report(&self) -> Option<&PatchReport> {
        self.report.get()
    }

    /// Whether initialization has run
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.report.get().is_some()
    }

    /// Configuration the layer was built from
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CompatConfig {
        &self.config
    }

    /// Patched framework targets
    #[inline]
    #[must_use]
    pub fn targets(&self) -> &Arc<FrameworkTargets> {
        self.registry.targets()
    }

    /// Underlying registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &PatchRegistry {
        &self.registry
    }

    /// Identity resolver over `store`, sized from configuration
    ///
    /// Initializes the layer first, then reads display names through the
    /// targets' patched `verbose_name_raw` accessor.
    #[must_use]
    pub fn resolver(&self, store: Arc<dyn IdentityStore>) -> IdentityResolver {
        self.ensure_initialized();
        let targets = Arc::clone(self.targets());
        IdentityResolver::with_cache(
            store,
            IdentityCache::with_capacity(self.config.identity.cache_capacity),
        )
        .with_display_name(Arc::new(move |model: &ModelDescriptor| {
            targets.options.verbose_name_raw(model)
        }))
    }
}
