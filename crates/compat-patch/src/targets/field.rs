//! Metadata fields and their ordering operator
//!
//! Fields are ordered by creation sequence. The stock operator is a legacy
//! three-way comparison that fails when the other operand is not a field.

use crate::slot::{PatchMarkers, Slot};
use crate::targets::PatchTarget;
use compat_detect::ProbeOutcome;
use std::any::Any;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

/// A model metadata field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    creation_counter: u64,
}

impl Field {
    /// Field name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation sequence number
    #[inline]
    #[must_use]
    pub fn creation_counter(&self) -> u64 {
        self.creation_counter
    }
}

/// Operand of a field comparison
#[derive(Debug, Clone, Copy)]
pub enum Comparand<'a> {
    /// A field
    Field(&'a Field),
    /// The null value
    Null,
    /// Any other object
    Other(&'a dyn Any),
}

/// Comparison failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
    /// The other operand lacks an attribute the operator reads
    #[error("operand has no attribute '{attribute}'")]
    MissingAttribute {
        /// Attribute name
        attribute: &'static str,
    },
}

/// Result of the ordering operator; `Ok(None)` means "not comparable"
pub type Comparison = Result<Option<Ordering>, CompareError>;

/// Ordering operator hook
pub type CompareBehavior = dyn Fn(Comparand<'_>, Comparand<'_>) -> Comparison + Send + Sync;

/// Field class: allocates creation sequence numbers and owns the ordering operator
#[derive(Debug)]
pub struct FieldClass {
    next_counter: AtomicU64,
    /// Ordering operator hook
    pub compare: Slot<CompareBehavior>,
    markers: PatchMarkers,
}

impl FieldClass {
    /// Field class with the legacy three-way comparison
    #[must_use]
    pub fn stock() -> Self {
        Self::with_compare(Arc::new(legacy_three_way))
    }

    /// Field class with an explicit ordering operator
    #[must_use]
    pub fn with_compare(compare: Arc<CompareBehavior>) -> Self {
        Self {
            next_counter: AtomicU64::new(0),
            compare: Slot::new("compare", compare),
            markers: PatchMarkers::new(),
        }
    }

    /// Create a field with the next creation sequence number
    pub fn new_field(&self, name: impl Into<String>) -> Field {
        Field {
            name: name.into(),
            creation_counter: self.next_counter.fetch_add(1, AtomicOrdering::SeqCst),
        }
    }

    /// Compare two operands through the current operator
    pub fn compare(&self, lhs: Comparand<'_>, rhs: Comparand<'_>) -> Comparison {
        (self.compare.current())(lhs, rhs)
    }

    /// Strict less-than; "not comparable" is `false`
    pub fn lt(&self, lhs: Comparand<'_>, rhs: Comparand<'_>) -> Result<bool, CompareError> {
        Ok(self.compare(lhs, rhs)? == Some(Ordering::Less))
    }

    /// Sort fields through the current operator
    ///
    /// # Errors
    /// Propagates the first comparison failure
    pub fn sort(&self, fields: &mut [Field]) -> Result<(), CompareError> {
        let mut failure = None;
        fields.sort_by(|a, b| match self.compare(Comparand::Field(a), Comparand::Field(b)) {
            Ok(ordering) => ordering.unwrap_or(Ordering::Equal),
            Err(e) => {
                failure.get_or_insert(e);
                Ordering::Equal
            }
        });
        failure.map_or(Ok(()), Err)
    }

    /// Compare a fresh field against null
    ///
    /// [`ProbeOutcome::Positive`] when the operator fails on the missing
    /// attribute, which is the defect the ordering patch fixes. The probe
    /// does not consume a creation sequence number.
    pub fn probe_null_comparison(&self) -> ProbeOutcome {
        let probe = Field {
            name: "probe".to_string(),
            creation_counter: self.next_counter.load(AtomicOrdering::SeqCst),
        };
        match self.compare(Comparand::Field(&probe), Comparand::Null) {
            Err(CompareError::MissingAttribute { .. }) => ProbeOutcome::Positive,
            Ok(_) => ProbeOutcome::Negative,
        }
    }
}

impl Default for FieldClass {
    fn default() -> Self {
        Self::stock()
    }
}

impl PatchTarget for FieldClass {
    fn target_name(&self) -> &'static str {
        "field"
    }

    fn markers(&self) -> &PatchMarkers {
        &self.markers
    }
}

fn legacy_three_way(lhs: Comparand<'_>, rhs: Comparand<'_>) -> Comparison {
    match (lhs, rhs) {
        (Comparand::Field(a), Comparand::Field(b)) => {
            Ok(Some(a.creation_counter.cmp(&b.creation_counter)))
        }
        _ => Err(CompareError::MissingAttribute {
            attribute: "creation_counter",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increase() {
        let class = FieldClass::stock();
        let a = class.new_field("title");
        let b = class.new_field("body");
        assert!(a.creation_counter() < b.creation_counter());
        assert_eq!(a.name(), "title");
    }

    #[test]
    fn legacy_orders_fields() {
        let class = FieldClass::stock();
        let a = class.new_field("a");
        let b = class.new_field("b");
        assert_eq!(class.lt(Comparand::Field(&a), Comparand::Field(&b)), Ok(true));
    }

    #[test]
    fn legacy_fails_against_null() {
        let class = FieldClass::stock();
        let a = class.new_field("a");
        assert!(class.compare(Comparand::Field(&a), Comparand::Null).is_err());
        assert_eq!(class.probe_null_comparison(), ProbeOutcome::Positive);
    }

    #[test]
    fn probe_does_not_consume_counter() {
        let class = FieldClass::stock();
        let _ = class.probe_null_comparison();
        assert_eq!(class.new_field("first").creation_counter(), 0);
    }

    #[test]
    fn sort_by_creation() {
        let class = FieldClass::stock();
        let a = class.new_field("a");
        let b = class.new_field("b");
        let c = class.new_field("c");
        let mut fields = vec![c.clone(), a.clone(), b.clone()];

        class.sort(&mut fields).unwrap();
        assert_eq!(fields, vec![a, b, c]);
    }
}
