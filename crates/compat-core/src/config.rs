//! Layer configuration
//!
//! Loaded from TOML or JSON. Every field has a default, so an empty document
//! is a valid configuration: no declared version and no connections, which
//! leaves every version- or backend-gated patch inapplicable.

use compat_detect::{
    BackendKind, ConnectionInfo, Environment, FrameworkVersion, StaticConnections,
    VersionParseError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML document
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid JSON document
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension is neither `.toml` nor `.json`
    #[error("unsupported configuration format: {}", path.display())]
    UnsupportedFormat {
        /// File path
        path: PathBuf,
    },

    /// Declared framework version does not parse
    #[error("invalid framework version: {0}")]
    InvalidVersion(#[from] VersionParseError),

    /// Log filter directive does not parse
    #[error("invalid log level '{level}': {reason}")]
    InvalidLogLevel {
        /// Configured directive
        level: String,
        /// Parser message
        reason: String,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// A configured storage connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Connection alias, also the storage route name
    pub alias: String,
    /// Engine identifier, e.g. `postgis` or a dotted engine path
    pub engine: String,
}

/// Identity resolver settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Entries kept per route; unbounded when absent
    pub cache_capacity: Option<u64>,
}

/// Compatibility layer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    /// Declared framework version, e.g. `"1.3.7"`
    pub framework_version: Option<String>,
    /// Configured connections
    pub connections: Vec<ConnectionConfig>,
    /// Log filter directive, e.g. `"info"` or `"compat_patch=debug"`
    pub log_level: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
    /// Identity resolver settings
    pub identity: IdentityConfig,
}

impl CompatConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With declared framework version
    #[inline]
    #[must_use]
    pub fn with_framework_version(mut self, version: impl Into<String>) -> Self {
        self.framework_version = Some(version.into());
        self
    }

    /// With an additional connection
    #[inline]
    #[must_use]
    pub fn with_connection(mut self, alias: impl Into<String>, engine: impl Into<String>) -> Self {
        self.connections.push(ConnectionConfig {
            alias: alias.into(),
            engine: engine.into(),
        });
        self
    }

    /// With log filter directive
    #[inline]
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// With per-route identity cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.identity.cache_capacity = Some(capacity);
        self
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] if the document is malformed
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Parse a JSON document
    ///
    /// # Errors
    /// Returns [`ConfigError::Json`] if the document is malformed
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load from a `.toml` or `.json` file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read, has another
    /// extension, or does not parse
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&source),
            Some("json") => Self::from_json_str(&source),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parsed framework version, if declared
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidVersion`] if the declared version does not parse
    pub fn parsed_framework_version(&self) -> Result<Option<FrameworkVersion>, ConfigError> {
        self.framework_version
            .as_deref()
            .map(str::parse::<FrameworkVersion>)
            .transpose()
            .map_err(ConfigError::from)
    }

    /// Connections with their engines classified
    #[must_use]
    pub fn connection_infos(&self) -> Vec<ConnectionInfo> {
        self.connections
            .iter()
            .map(|c| ConnectionInfo::new(c.alias.clone(), BackendKind::from_engine(&c.engine)))
            .collect()
    }

    /// Detection environment described by this configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidVersion`] if the declared version does not parse
    pub fn environment(&self) -> Result<Environment, ConfigError> {
        Ok(Environment::new(
            self.parsed_framework_version()?,
            Arc::new(StaticConnections::new(self.connection_infos())),
        ))
    }
}
