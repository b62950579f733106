//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity: two values with the same attributes are
/// equal. They are replaced rather than mutated.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct LoanPeriod { days: i64 }
///
/// impl ValueObject for LoanPeriod {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
