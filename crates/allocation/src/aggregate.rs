use std::collections::HashMap;

use stockroute_core::{ItemId, ItemLocationKey, LocationId, OrderId};
use stockroute_sales::{Order, OrderItem};

/// Allocated quantity for one order, by (item, location).
///
/// Quantities are summed per cell across every `add`. The first snapshot of
/// each item is kept; later `add` calls for the same item only contribute
/// quantities. Zero cells are never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationAggregate {
    order_id: OrderId,
    fulfilment_location_id: LocationId,
    items: Vec<OrderItem>,
    cells: HashMap<ItemLocationKey, i64>,
    // First-seen order of locations, for deterministic iteration.
    locations: Vec<LocationId>,
}

impl AllocationAggregate {
    pub fn new(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            fulfilment_location_id: order.fulfilment_location_id,
            items: Vec::new(),
            cells: HashMap::new(),
            locations: Vec::new(),
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn fulfilment_location_id(&self) -> LocationId {
        self.fulfilment_location_id
    }

    /// Fold one item's per-location allocation into the aggregate.
    pub fn add(&mut self, item: &OrderItem, quantities: &[(LocationId, i64)]) {
        if !self.items.iter().any(|i| i.item_id == item.item_id) {
            self.items.push(item.clone());
        }

        for (location_id, quantity) in quantities {
            if *quantity <= 0 {
                continue;
            }
            *self
                .cells
                .entry(ItemLocationKey::new(item.item_id, *location_id))
                .or_insert(0) += quantity;
            if !self.locations.contains(location_id) {
                self.locations.push(*location_id);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn allocated_quantity(&self, item_id: ItemId) -> i64 {
        self.cells
            .iter()
            .filter(|(key, _)| key.item_id == item_id)
            .map(|(_, quantity)| *quantity)
            .sum()
    }

    pub fn total_allocated(&self) -> i64 {
        self.cells.values().sum()
    }

    /// Distinct locations holding an allocation, in first-seen order.
    pub fn locations_used(&self) -> &[LocationId] {
        &self.locations
    }

    pub fn locations_used_excluding(&self, excluded: LocationId) -> Vec<LocationId> {
        self.locations
            .iter()
            .copied()
            .filter(|loc| *loc != excluded)
            .collect()
    }

    /// Item → quantity allocated at `location_id`, in item registration order.
    pub fn items_for_location(&self, location_id: LocationId) -> Vec<(ItemId, i64)> {
        self.items
            .iter()
            .filter_map(|item| {
                self.cells
                    .get(&ItemLocationKey::new(item.item_id, location_id))
                    .map(|quantity| (item.item_id, *quantity))
            })
            .collect()
    }

    pub fn order_item(&self, item_id: ItemId) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    pub fn order_items(&self) -> &[OrderItem] {
        &self.items
    }
}

/// Aggregates for every order touched in one run.
#[derive(Debug, Clone, Default)]
pub struct AllocationAggregator {
    aggregates: Vec<AllocationAggregate>,
}

impl AllocationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate for `order`, created on first use.
    pub fn for_order(&mut self, order: &Order) -> &mut AllocationAggregate {
        let idx = match self.aggregates.iter().position(|a| a.order_id == order.order_id) {
            Some(idx) => idx,
            None => {
                self.aggregates.push(AllocationAggregate::new(order));
                self.aggregates.len() - 1
            }
        };
        &mut self.aggregates[idx]
    }

    pub fn get(&self, order_id: OrderId) -> Option<&AllocationAggregate> {
        self.aggregates.iter().find(|a| a.order_id == order_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AllocationAggregate> {
        self.aggregates.iter()
    }

    pub fn total_allocated(&self) -> i64 {
        self.aggregates.iter().map(AllocationAggregate::total_allocated).sum()
    }
}
