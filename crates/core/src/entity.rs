//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Orders and order lines are entities: two snapshots with the same id describe
/// the same remote record, even when quantities differ between them.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
