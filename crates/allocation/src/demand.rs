use serde::{Deserialize, Serialize};

use stockroute_core::{ItemId, LocationId, OrderId};
use stockroute_sales::{Order, OrderItem};

/// Quantity of one order line (or one of its bin-racks) that needs a home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandLine {
    pub order_id: OrderId,
    pub item_id: ItemId,
    /// `None` when the demand covers the whole line rather than one bin-rack.
    pub bin_rack_index: Option<usize>,
    pub source_location_id: LocationId,
    pub quantity: i64,
}

impl DemandLine {
    pub fn whole_line(order_id: OrderId, item_id: ItemId, source_location_id: LocationId, quantity: i64) -> Self {
        Self {
            order_id,
            item_id,
            bin_rack_index: None,
            source_location_id,
            quantity,
        }
    }

    /// One demand line per bin-rack of `item`, in bin-rack order.
    ///
    /// A line without bin-racks is treated as a single bin-rack holding the
    /// whole quantity at the order's fulfilment location.
    pub fn per_bin_rack(order: &Order, item: &OrderItem) -> Vec<Self> {
        if item.bin_racks.is_empty() {
            return vec![Self {
                order_id: order.order_id,
                item_id: item.item_id,
                bin_rack_index: Some(0),
                source_location_id: order.fulfilment_location_id,
                quantity: item.quantity,
            }];
        }

        item.bin_racks
            .iter()
            .enumerate()
            .map(|(index, bin_rack)| Self {
                order_id: order.order_id,
                item_id: item.item_id,
                bin_rack_index: Some(index),
                source_location_id: bin_rack.location_id,
                quantity: bin_rack.quantity,
            })
            .collect()
    }
}
