use serde::{Deserialize, Serialize};

use stockroute_core::{DomainError, DomainResult, ItemId, ItemLocationKey, LocationId};

/// Running stock counters for one item at one location.
///
/// `running_available` may be negative: the location already owes more than it
/// holds (an existing backorder). `running_in_order` is stock already promised
/// to open orders. `commit` and `release` only move quantity between the two
/// counters, so `running_available + running_in_order` never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPosition {
    item_id: ItemId,
    location_id: LocationId,
    running_available: i64,
    running_in_order: i64,
}

impl StockPosition {
    pub fn new(item_id: ItemId, location_id: LocationId, available: i64, in_order: i64) -> Self {
        Self {
            item_id,
            location_id,
            running_available: available,
            running_in_order: in_order,
        }
    }

    /// Explicit zero position for a pair with no live stock data.
    pub fn empty(item_id: ItemId, location_id: LocationId) -> Self {
        Self::new(item_id, location_id, 0, 0)
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn key(&self) -> ItemLocationKey {
        ItemLocationKey::new(self.item_id, self.location_id)
    }

    pub fn running_available(&self) -> i64 {
        self.running_available
    }

    pub fn running_in_order(&self) -> i64 {
        self.running_in_order
    }

    /// Conserved quantity (available + in order).
    pub fn total(&self) -> i64 {
        self.running_available + self.running_in_order
    }

    pub fn is_short(&self) -> bool {
        self.running_available < 0
    }

    /// How much of `requested` can be taken from this position right now.
    ///
    /// A short position gives up the requested quantity reduced by its
    /// shortfall, floored at zero.
    pub fn allowed_allocation(&self, requested: i64) -> i64 {
        let requested = requested.max(0);
        if self.running_available < 0 {
            return (requested + self.running_available).max(0);
        }

        requested.min(self.running_available)
    }

    /// Quantity of `requested` still unmet after taking `allowed_allocation`.
    ///
    /// `allowed_allocation(q) + backorder_remainder(q) == q` for every `q >= 0`.
    pub fn backorder_remainder(&self, requested: i64) -> i64 {
        let requested = requested.max(0);
        if self.running_available < 0 {
            return self.running_available.abs().min(requested);
        }

        (requested - self.running_available).max(0)
    }

    /// Move `quantity` from available into in-order. Zero is a no-op.
    pub fn commit(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity == 0 {
            return Ok(());
        }
        if quantity < 0 {
            return Err(DomainError::validation(format!(
                "cannot commit negative quantity {quantity} for {}",
                self.key()
            )));
        }
        if quantity > self.running_available {
            return Err(DomainError::insufficient_stock(format!(
                "cannot commit {quantity} for {} (available: {})",
                self.key(),
                self.running_available
            )));
        }

        self.running_available -= quantity;
        self.running_in_order += quantity;
        Ok(())
    }

    /// Move `quantity` from in-order back into available. Zero is a no-op.
    pub fn release(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity == 0 {
            return Ok(());
        }
        if quantity < 0 {
            return Err(DomainError::validation(format!(
                "cannot release negative quantity {quantity} for {}",
                self.key()
            )));
        }
        if quantity > self.running_in_order {
            return Err(DomainError::insufficient_stock(format!(
                "cannot release {quantity} for {} (in order: {})",
                self.key(),
                self.running_in_order
            )));
        }

        self.running_available += quantity;
        self.running_in_order -= quantity;
        Ok(())
    }
}
