use serde::{Deserialize, Serialize};

use stockroute_core::{DomainError, DomainResult, ItemId, LocationId};

use crate::ledger::StockLedger;

/// Shortfall of one item at the primary location, with what each alternate
/// location could offer.
///
/// `alternate_available[i]` lines up with the i-th alternate location in the
/// ordering the caller used to build it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackorderAvailabilityDetail {
    item_id: ItemId,
    quantity: i64,
    alternate_available: Vec<i64>,
}

impl BackorderAvailabilityDetail {
    /// `backorder_quantity` is the raw running available at the primary and must
    /// be strictly negative; the detail stores its magnitude.
    pub fn new(item_id: ItemId, backorder_quantity: i64, alternate_available: Vec<i64>) -> DomainResult<Self> {
        if backorder_quantity >= 0 {
            return Err(DomainError::validation(format!(
                "backorder quantity must be negative for item {item_id} (found {backorder_quantity})"
            )));
        }

        Ok(Self {
            item_id,
            quantity: backorder_quantity.abs(),
            alternate_available,
        })
    }

    /// Build from the current ledger state at `primary` and `alternates`.
    pub fn from_ledger(
        ledger: &StockLedger,
        item_id: ItemId,
        primary: LocationId,
        alternates: &[LocationId],
    ) -> DomainResult<Self> {
        let backorder = ledger.position(item_id, primary)?.running_available();
        let alternate_available = alternates
            .iter()
            .map(|location| Ok(ledger.position(item_id, *location)?.running_available()))
            .collect::<DomainResult<Vec<_>>>()?;

        Self::new(item_id, backorder, alternate_available)
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Absolute shortfall at the primary location.
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn alternate_available(&self) -> &[i64] {
        &self.alternate_available
    }

    /// Stock the alternates could offer in total (short alternates count as zero).
    pub fn total_alternate_available(&self) -> i64 {
        self.alternate_available.iter().map(|q| (*q).max(0)).sum()
    }

    pub fn alternates_cover_shortfall(&self) -> bool {
        self.total_alternate_available() >= self.quantity
    }

    /// Portion of an order line of `line_quantity` that is backordered.
    pub fn demand_for(&self, line_quantity: i64) -> i64 {
        self.quantity.min(line_quantity.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::StockPosition;

    #[test]
    fn construction_requires_a_negative_backorder() {
        let item = ItemId::new();
        for raw in [0, 5] {
            let err = BackorderAvailabilityDetail::new(item, raw, vec![1]).unwrap_err();
            assert!(matches!(err, DomainError::Validation(msg) if msg.contains("must be negative")));
        }

        let detail = BackorderAvailabilityDetail::new(item, -7, vec![3, 0, -2]).unwrap();
        assert_eq!(detail.quantity(), 7);
        assert_eq!(detail.alternate_available(), &[3, 0, -2]);
        assert_eq!(detail.total_alternate_available(), 3);
        assert!(!detail.alternates_cover_shortfall());
    }

    #[test]
    fn demand_is_capped_by_the_order_line() {
        let detail = BackorderAvailabilityDetail::new(ItemId::new(), -12, vec![]).unwrap();
        assert_eq!(detail.demand_for(5), 5);
        assert_eq!(detail.demand_for(20), 12);
    }

    #[test]
    fn from_ledger_is_index_aligned_with_alternates() {
        let item = ItemId::new();
        let primary = LocationId::new();
        let alt1 = LocationId::new();
        let alt2 = LocationId::new();

        let mut ledger = StockLedger::new();
        ledger.insert(StockPosition::new(item, primary, -4, 10));
        ledger.insert(StockPosition::new(item, alt1, 1, 0));
        ledger.insert(StockPosition::new(item, alt2, 8, 0));

        let detail = BackorderAvailabilityDetail::from_ledger(&ledger, item, primary, &[alt2, alt1]).unwrap();
        assert_eq!(detail.quantity(), 4);
        assert_eq!(detail.alternate_available(), &[8, 1]);
        assert!(detail.alternates_cover_shortfall());
    }
}
