//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their attribute
//! values. A stock location entry or the provenance of a removal are value objects:
//! two entries with the same name and quantity are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new value.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Provenance {
///     recipient: Option<String>,
///     destination_location: Option<String>,
/// }
///
/// impl ValueObject for Provenance {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
