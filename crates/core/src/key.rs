//! Composite keys shared by the ledger and the allocation aggregate.

use serde::{Deserialize, Serialize};

use crate::id::{ItemId, LocationId};
use crate::value_object::ValueObject;

/// (item, location) pair used directly as a map key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemLocationKey {
    pub item_id: ItemId,
    pub location_id: LocationId,
}

impl ItemLocationKey {
    pub fn new(item_id: ItemId, location_id: LocationId) -> Self {
        Self {
            item_id,
            location_id,
        }
    }
}

impl core::fmt::Display for ItemLocationKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "item {} @ location {}", self.item_id, self.location_id)
    }
}

impl ValueObject for ItemLocationKey {}
