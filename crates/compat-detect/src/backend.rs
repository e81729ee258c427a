//! Storage backends and the connection registry
//!
//! Backend-specific patches only apply when a configured connection uses the
//! affected backend. [`ConnectionRegistry`] is the seam hosts implement to
//! expose their live connections.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage backend behind a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// PostgreSQL with the spatial (PostGIS) extension
    PostGis,
    /// Plain PostgreSQL
    PostgreSql,
    /// MySQL / MariaDB
    MySql,
    /// SQLite
    Sqlite,
    /// SQLite with the spatial (SpatiaLite) extension
    SpatiaLite,
    /// Oracle
    Oracle,
    /// Anything else, keyed by the engine identifier
    Other(String),
}

impl BackendKind {
    /// Classify an engine identifier
    ///
    /// Accepts bare names (`postgis`) and dotted engine paths whose last
    /// segment names the backend (`framework.gis.backends.postgis`).
    #[must_use]
    pub fn from_engine(engine: &str) -> Self {
        let name = engine.rsplit('.').next().unwrap_or(engine).to_ascii_lowercase();
        match name.as_str() {
            "postgis" => Self::PostGis,
            "postgresql" | "postgresql_psycopg2" | "postgres" => Self::PostgreSql,
            "mysql" => Self::MySql,
            "sqlite" | "sqlite3" => Self::Sqlite,
            "spatialite" => Self::SpatiaLite,
            "oracle" => Self::Oracle,
            _ => Self::Other(engine.to_string()),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostGis => f.write_str("postgis"),
            Self::PostgreSql => f.write_str("postgresql"),
            Self::MySql => f.write_str("mysql"),
            Self::Sqlite => f.write_str("sqlite"),
            Self::SpatiaLite => f.write_str("spatialite"),
            Self::Oracle => f.write_str("oracle"),
            Self::Other(engine) => f.write_str(engine),
        }
    }
}

/// A configured connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Connection alias, e.g. `default`
    pub alias: String,
    /// Backend serving the connection
    pub backend: BackendKind,
}

impl ConnectionInfo {
    /// Create connection info
    #[inline]
    #[must_use]
    pub fn new(alias: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            alias: alias.into(),
            backend,
        }
    }
}

/// Enumerates the active connections
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionRegistry: Send + Sync {
    /// Snapshot of every configured connection
    fn connections(&self) -> Vec<ConnectionInfo>;
}

/// Fixed connection list, typically built from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticConnections {
    connections: Vec<ConnectionInfo>,
}

impl StaticConnections {
    /// Create registry from a list
    #[inline]
    #[must_use]
    pub fn new(connections: Vec<ConnectionInfo>) -> Self {
        Self { connections }
    }

    /// Registry without connections
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl ConnectionRegistry for StaticConnections {
    fn connections(&self) -> Vec<ConnectionInfo> {
        self.connections.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_paths_classify_by_last_segment() {
        assert_eq!(
            BackendKind::from_engine("framework.contrib.gis.db.backends.postgis"),
            BackendKind::PostGis
        );
        assert_eq!(
            BackendKind::from_engine("framework.db.backends.postgresql_psycopg2"),
            BackendKind::PostgreSql
        );
        assert_eq!(BackendKind::from_engine("sqlite3"), BackendKind::Sqlite);
        assert_eq!(BackendKind::from_engine("PostGIS"), BackendKind::PostGis);
    }

    #[test]
    fn unknown_engine_is_kept_verbatim() {
        let kind = BackendKind::from_engine("acme.db.backends.columnar");
        assert_eq!(kind, BackendKind::Other("acme.db.backends.columnar".to_string()));
        assert_eq!(kind.to_string(), "acme.db.backends.columnar");
    }

    #[test]
    fn static_connections_snapshot() {
        let registry = StaticConnections::new(vec![ConnectionInfo::new("default", BackendKind::Sqlite)]);
        assert_eq!(registry.connections().len(), 1);
        assert!(StaticConnections::empty().connections().is_empty());
    }
}
