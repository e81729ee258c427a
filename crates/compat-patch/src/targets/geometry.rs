//! Spatial geometry adapter
//!
//! The framework adapts geometry values for the PostGIS backend in three
//! steps: initialize from the EWKB payload, prepare against a connection, and
//! render as a quoted SQL expression.

use crate::slot::{PatchMarkers, Slot};
use crate::targets::PatchTarget;
use compat_detect::ConnectionInfo;
use std::fmt::Write as _;
use std::sync::Arc;

/// Initialize hook, run when an adapter is created
pub type InitBehavior = dyn Fn(&mut AdapterState) + Send + Sync;

/// Prepare hook, run before the value is sent over a connection
pub type PrepareBehavior = dyn Fn(&mut AdapterState, &ConnectionInfo) + Send + Sync;

/// Render hook producing the SQL expression
pub type QuoteBehavior = dyn Fn(&AdapterState) -> String + Send + Sync;

/// Opaque binary query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryParam {
    bytes: Vec<u8>,
    connection: Option<String>,
}

impl BinaryParam {
    /// Wrap raw bytes
    #[inline]
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            connection: None,
        }
    }

    /// Bind the parameter to a connection
    pub fn prepare(&mut self, connection: &ConnectionInfo) {
        self.connection = Some(connection.alias.clone());
    }

    /// Alias of the connection the parameter was prepared for
    #[inline]
    #[must_use]
    pub fn prepared_for(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Hex-format `bytea` literal
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("'\\x{}'::bytea", hex::encode(&self.bytes))
    }
}

/// Per-value adapter state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterState {
    /// Extended well-known binary payload
    pub ewkb: Vec<u8>,
    /// Binary parameter carrying the payload, when one is attached
    pub binary: Option<BinaryParam>,
}

/// Geometry adapter class shared by every geometry value
#[derive(Debug)]
pub struct GeometryAdapterClass {
    /// Initialize hook
    pub init: Slot<InitBehavior>,
    /// Prepare hook
    pub prepare: Slot<PrepareBehavior>,
    /// Render hook
    pub quote: Slot<QuoteBehavior>,
    markers: PatchMarkers,
}

impl GeometryAdapterClass {
    /// Adapter with the framework's stock behavior
    ///
    /// The stock renderer inlines the payload as an escape-format string
    /// literal, which some server configurations misread.
    #[must_use]
    pub fn stock() -> Self {
        Self {
            init: Slot::new("init", Arc::new(|_: &mut AdapterState| {})),
            prepare: Slot::new("prepare", Arc::new(|_: &mut AdapterState, _: &ConnectionInfo| {})),
            quote: Slot::new("getquoted", Arc::new(|state: &AdapterState| {
                format!("ST_GeomFromEWKB(E'{}')", escape_bytea(&state.ewkb))
            })),
            markers: PatchMarkers::new(),
        }
    }

    /// Adapt a geometry payload
    #[must_use]
    pub fn adapt(&self, ewkb: impl Into<Vec<u8>>) -> GeometryAdapter<'_> {
        let mut state = AdapterState {
            ewkb: ewkb.into(),
            binary: None,
        };
        (self.init.current())(&mut state);
        GeometryAdapter { class: self, state }
    }
}

impl Default for GeometryAdapterClass {
    fn default() -> Self {
        Self::stock()
    }
}

impl PatchTarget for GeometryAdapterClass {
    fn target_name(&self) -> &'static str {
        "geometry_adapter"
    }

    fn markers(&self) -> &PatchMarkers {
        &self.markers
    }
}

/// A geometry value being adapted for transmission
#[derive(Debug)]
pub struct GeometryAdapter<'a> {
    class: &'a GeometryAdapterClass,
    state: AdapterState,
}

impl GeometryAdapter<'_> {
    /// Prepare for `connection`
    pub fn prepare(&mut self, connection: &ConnectionInfo) {
        (self.class.prepare.current())(&mut self.state, connection);
    }

    /// Render as SQL
    #[must_use]
    pub fn quoted(&self) -> String {
        (self.class.quote.current())(&self.state)
    }

    /// Adapter state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &AdapterState {
        &self.state
    }
}

fn escape_bytea(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\\\\\"),
            b'\'' => out.push_str("''"),
            0x20..=0x7e => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\\\{b:03o}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use compat_detect::BackendKind;

    #[test]
    fn stock_renders_escaped_literal() {
        let class = GeometryAdapterClass::stock();
        let adapter = class.adapt(vec![0x01, b'A', b'\'']);

        assert_eq!(adapter.quoted(), "ST_GeomFromEWKB(E'\\\\001A''')");
        assert!(adapter.state().binary.is_none());
    }

    #[test]
    fn stock_prepare_is_noop() {
        let class = GeometryAdapterClass::stock();
        let mut adapter = class.adapt(vec![1, 2, 3]);
        let before = adapter.state().clone();

        adapter.prepare(&ConnectionInfo::new("default", BackendKind::PostGis));
        assert_eq!(adapter.state(), &before);
    }

    #[test]
    fn binary_param_hex_literal() {
        let mut param = BinaryParam::new(vec![0x01, 0xff]);
        assert_eq!(param.quoted(), "'\\x01ff'::bytea");
        assert_eq!(param.prepared_for(), None);

        param.prepare(&ConnectionInfo::new("gis", BackendKind::PostGis));
        assert_eq!(param.prepared_for(), Some("gis"));
    }
}
