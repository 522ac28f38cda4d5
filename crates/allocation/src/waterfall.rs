//! Priority-ordered allocation of one demand line across candidate locations.
//!
//! For every target, in order:
//!
//! ```text
//! allowed, remainder  <- evaluated against the target before any mutation
//! commit(target, allowed)      (skipped when target == source)
//! release(source, allowed)
//! bin_racks[(bin_rack, target)] = allowed   (set, never summed)
//! remaining <- remainder; stop at zero
//! ```
//!
//! Each unit of the demand ends either committed at some target or as the
//! returned backorder.

use serde::{Deserialize, Serialize};

use stockroute_core::{DomainResult, ItemId, LocationId};
use stockroute_inventory::StockLedger;
use stockroute_sales::BinRack;

use crate::demand::DemandLine;
use crate::policy::AllocationPolicy;

/// Key of one entry in an item's rewritten bin-rack breakdown.
///
/// Keyed per source bin-rack so two bin-racks of the same item that land on the
/// same location stay separate entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinRackKey {
    pub bin_rack_index: Option<usize>,
    pub location_id: LocationId,
}

/// One allocation produced by the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub quantity: i64,
}

/// Rewritten bin-rack breakdown of one order item, in first-written order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinRackAllocations {
    item_id: ItemId,
    entries: Vec<(BinRackKey, i64)>,
}

impl BinRackAllocations {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            entries: Vec::new(),
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Overwrite the quantity for `key`; a zero quantity removes the entry.
    pub fn set(&mut self, key: BinRackKey, quantity: i64) {
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(idx) if quantity == 0 => {
                self.entries.remove(idx);
            }
            Some(idx) => self.entries[idx].1 = quantity,
            None if quantity == 0 => {}
            None => self.entries.push((key, quantity)),
        }
    }

    /// Add onto the quantity for `key`.
    pub fn add(&mut self, key: BinRackKey, quantity: i64) {
        let current = self.get(key);
        self.set(key, current + quantity);
    }

    pub fn get(&self, key: BinRackKey) -> i64 {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, q)| *q)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> i64 {
        self.entries.iter().map(|(_, q)| *q).sum()
    }

    /// Bin-racks in the order they were first written.
    pub fn bin_racks(&self) -> Vec<BinRack> {
        self.entries
            .iter()
            .map(|(key, quantity)| BinRack::new(key.location_id, *quantity))
            .collect()
    }

    /// Bin-racks that landed on `location_id`.
    pub fn bin_racks_at(&self, location_id: LocationId) -> Vec<BinRack> {
        self.bin_racks()
            .into_iter()
            .filter(|br| br.location_id == location_id)
            .collect()
    }

    /// Quantity per location (summed across bin-racks), in first-seen order.
    pub fn quantities_by_location(&self) -> Vec<(LocationId, i64)> {
        let mut totals: Vec<(LocationId, i64)> = Vec::new();
        for (key, quantity) in &self.entries {
            match totals.iter_mut().find(|(loc, _)| *loc == key.location_id) {
                Some((_, total)) => *total += quantity,
                None => totals.push((key.location_id, *quantity)),
            }
        }
        totals
    }
}

/// Result of walking one demand line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterfallOutcome {
    pub item_id: ItemId,
    pub demand: i64,
    /// Non-zero allocations, in walk order.
    pub allocations: Vec<AllocationRecord>,
    /// Quantity left unmet after the walk.
    pub backorder: i64,
    /// Targets evaluated (skipped targets excluded).
    pub steps: usize,
    pub skipped: usize,
}

impl WaterfallOutcome {
    fn new(item_id: ItemId, demand: i64) -> Self {
        Self {
            item_id,
            demand,
            allocations: Vec::new(),
            backorder: demand,
            steps: 0,
            skipped: 0,
        }
    }

    pub fn allocated(&self) -> i64 {
        self.allocations.iter().map(|a| a.quantity).sum()
    }

    pub fn quantity_at(&self, location_id: LocationId) -> i64 {
        self.allocations
            .iter()
            .filter(|a| a.location_id == location_id)
            .map(|a| a.quantity)
            .sum()
    }

    /// (location, quantity) pairs, for folding into an aggregate.
    pub fn per_location(&self) -> Vec<(LocationId, i64)> {
        self.allocations
            .iter()
            .map(|a| (a.location_id, a.quantity))
            .collect()
    }
}

/// Drives one demand line across an ordered list of target locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaterfallAllocator {
    policy: AllocationPolicy,
}

impl WaterfallAllocator {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Allocate `demand` across `targets`, mutating `ledger` and writing the
    /// item's bin-rack breakdown into `bin_racks`.
    ///
    /// Ledger underflow (`InsufficientStock`) and unseeded pairs
    /// (`InconsistentSnapshot`) are returned as errors; neither can happen when
    /// the ledger was seeded for every location involved.
    pub fn allocate(
        &self,
        ledger: &mut StockLedger,
        demand: &DemandLine,
        targets: &[LocationId],
        bin_racks: &mut BinRackAllocations,
    ) -> DomainResult<WaterfallOutcome> {
        let item_id = demand.item_id;
        let source = demand.source_location_id;
        let mut outcome = WaterfallOutcome::new(item_id, demand.quantity.max(0));
        let mut remaining = outcome.demand;

        for target in self.policy.walk_order(source, targets) {
            if remaining == 0 {
                break;
            }

            let position = ledger.position(item_id, target)?;
            if self.policy.skip_zero_available_targets && position.running_available() == 0 {
                outcome.skipped += 1;
                continue;
            }

            // The source may hand back part of a shortfall it already carries;
            // any other location can only give what it actually holds.
            let (allowed, remainder) = if target == source {
                (
                    position.allowed_allocation(remaining),
                    position.backorder_remainder(remaining),
                )
            } else {
                let allowed = position
                    .allowed_allocation(remaining)
                    .min(position.running_available().max(0));
                (allowed, remaining - allowed)
            };

            if target != source {
                ledger.commit(item_id, target, allowed)?;
            }
            ledger.release(item_id, source, allowed)?;

            bin_racks.set(
                BinRackKey {
                    bin_rack_index: demand.bin_rack_index,
                    location_id: target,
                },
                allowed,
            );
            if allowed > 0 {
                outcome.allocations.push(AllocationRecord {
                    item_id,
                    location_id: target,
                    quantity: allowed,
                });
            }

            outcome.steps += 1;
            remaining = remainder;
        }

        if remaining > 0 && self.policy.backorder_to_source_bin_rack {
            bin_racks.add(
                BinRackKey {
                    bin_rack_index: demand.bin_rack_index,
                    location_id: source,
                },
                remaining,
            );
        }

        outcome.backorder = remaining;
        Ok(outcome)
    }
}
