//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**. They are defined entirely by their
//! attribute values, so two value objects with the same values are equal.

/// Marker trait for value objects.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: `ItemLocationKey { item, location }`, `BinRack { location, quantity }`
/// - **Entity**: `Order { id: OrderId(...), .. }`
///
/// Value objects are immutable; to "modify" one, build a new one. Composite map
/// keys in the allocation core are always value objects rather than formatted
/// strings, so a key can never be mis-assembled.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// struct ItemLocationKey { item_id: ItemId, location_id: LocationId }
///
/// impl ValueObject for ItemLocationKey {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
