//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Entities are owned by an aggregate root and only change through it (or
/// through a live handle the aggregate hands out).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Whether this entity carries the given identifier.
    fn has_id(&self, id: Self::Id) -> bool {
        self.id() == id
    }
}
