//! Tracing subscriber setup

use crate::config::{CompatConfig, ConfigError, LogFormat};
use tracing_subscriber::EnvFilter;

/// Default filter when neither configuration nor `RUST_LOG` sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Build the event filter
///
/// An explicit `level` wins over `RUST_LOG`; without either the filter is
/// [`DEFAULT_LOG_LEVEL`].
///
/// # Errors
/// Returns [`ConfigError::InvalidLogLevel`] if `level` is not a valid directive
pub fn env_filter(level: Option<&str>) -> Result<EnvFilter, ConfigError> {
    match level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| ConfigError::InvalidLogLevel {
            level: level.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))),
    }
}

/// Install a global text subscriber
///
/// Returns `Ok(false)` if a global subscriber was already installed.
///
/// # Errors
/// Returns [`ConfigError::InvalidLogLevel`] if `level` is not a valid directive
pub fn init_tracing(level: Option<&str>) -> Result<bool, ConfigError> {
    init_with_format(level, LogFormat::Text)
}

/// Install a global subscriber as configured
///
/// # Errors
/// Returns [`ConfigError::InvalidLogLevel`] if the configured level is invalid
pub fn init_from_config(config: &CompatConfig) -> Result<bool, ConfigError> {
    init_with_format(config.log_level.as_deref(), config.log_format)
}

fn init_with_format(level: Option<&str>, format: LogFormat) -> Result<bool, ConfigError> {
    let filter = env_filter(level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = match format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    if installed {
        tracing::debug!(?format, "tracing initialized");
    }
    Ok(installed)
}
