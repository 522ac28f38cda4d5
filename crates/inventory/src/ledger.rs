use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use stockroute_core::{DomainError, DomainResult, ItemId, ItemLocationKey, LocationId};

use crate::position::StockPosition;

/// Stock level for one item at one location, as reported by the stock source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationStockLevel {
    pub location_id: LocationId,
    pub available: i64,
    pub in_order: i64,
}

/// All reported stock levels for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevelSnapshot {
    pub item_id: ItemId,
    pub levels: Vec<LocationStockLevel>,
}

/// Per (item, location) running stock counters for a single allocation run.
///
/// The ledger is seeded once from a snapshot and then mutated by the allocator.
/// It is the global stock pool for the run: every order draws from the same
/// ledger, so it must be driven from one thread of control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockLedger {
    positions: HashMap<ItemLocationKey, StockPosition>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ledger with one position for every (item, location) pair needed.
    ///
    /// - Snapshot rows for locations outside `locations` are ignored.
    /// - Pairs without a snapshot row get an explicit empty position, so the
    ///   allocator never looks up a missing entry.
    pub fn seed(snapshots: &[StockLevelSnapshot], items: &[ItemId], locations: &[LocationId]) -> Self {
        let wanted_items: BTreeSet<ItemId> = items.iter().copied().collect();
        let wanted_locations: BTreeSet<LocationId> = locations.iter().copied().collect();

        let mut ledger = Self::new();
        for snapshot in snapshots {
            if !wanted_items.contains(&snapshot.item_id) {
                continue;
            }
            for level in &snapshot.levels {
                if !wanted_locations.contains(&level.location_id) {
                    continue;
                }
                ledger.insert(StockPosition::new(
                    snapshot.item_id,
                    level.location_id,
                    level.available,
                    level.in_order,
                ));
            }
        }

        for item_id in &wanted_items {
            for location_id in &wanted_locations {
                let key = ItemLocationKey::new(*item_id, *location_id);
                ledger
                    .positions
                    .entry(key)
                    .or_insert_with(|| StockPosition::empty(*item_id, *location_id));
            }
        }

        ledger
    }

    /// Insert (or replace) a position.
    pub fn insert(&mut self, position: StockPosition) {
        self.positions.insert(position.key(), position);
    }

    pub fn contains(&self, item_id: ItemId, location_id: LocationId) -> bool {
        self.positions
            .contains_key(&ItemLocationKey::new(item_id, location_id))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, item_id: ItemId, location_id: LocationId) -> DomainResult<&StockPosition> {
        let key = ItemLocationKey::new(item_id, location_id);
        self.positions
            .get(&key)
            .ok_or_else(|| DomainError::inconsistent_snapshot(format!("no stock position for {key}")))
    }

    fn position_mut(&mut self, item_id: ItemId, location_id: LocationId) -> DomainResult<&mut StockPosition> {
        let key = ItemLocationKey::new(item_id, location_id);
        self.positions
            .get_mut(&key)
            .ok_or_else(|| DomainError::inconsistent_snapshot(format!("no stock position for {key}")))
    }

    pub fn allowed_allocation(&self, item_id: ItemId, location_id: LocationId, requested: i64) -> DomainResult<i64> {
        Ok(self.position(item_id, location_id)?.allowed_allocation(requested))
    }

    pub fn backorder_remainder(&self, item_id: ItemId, location_id: LocationId, requested: i64) -> DomainResult<i64> {
        Ok(self.position(item_id, location_id)?.backorder_remainder(requested))
    }

    pub fn commit(&mut self, item_id: ItemId, location_id: LocationId, quantity: i64) -> DomainResult<()> {
        self.position_mut(item_id, location_id)?.commit(quantity)
    }

    pub fn release(&mut self, item_id: ItemId, location_id: LocationId, quantity: i64) -> DomainResult<()> {
        self.position_mut(item_id, location_id)?.release(quantity)
    }

    /// All positions held for one item (unordered).
    pub fn positions_for_item(&self, item_id: ItemId) -> impl Iterator<Item = &StockPosition> {
        self.positions
            .values()
            .filter(move |p| p.item_id() == item_id)
    }

    /// Σ (available + in order) across every location for one item.
    pub fn total_for_item(&self, item_id: ItemId) -> i64 {
        self.positions_for_item(item_id).map(StockPosition::total).sum()
    }
}
