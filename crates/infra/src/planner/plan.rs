use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroute_allocation::AllocationRecord;
use stockroute_core::LocationId;
use stockroute_sales::{CustomerInfo, GeneralInfo, Order, OrderItem, ShippingInfo};

use crate::gateway::NewOrderLine;

/// Where an evaluated order ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    /// Nothing to change; no mutation is sent.
    Skipped,
    /// The original order's bin-racks are rewritten, nothing is split off.
    RewritingInPlace,
    /// Part of the order moves into new orders at other locations.
    PlanningSplits,
}

/// A change to one line of the original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemChange {
    Update(OrderItem),
    Remove(OrderItem),
}

impl ItemChange {
    /// `Update` when `item` still carries quantity, `Remove` otherwise.
    pub fn for_item(item: OrderItem) -> Self {
        if item.quantity > 0 {
            ItemChange::Update(item)
        } else {
            ItemChange::Remove(item)
        }
    }

    pub fn item(&self) -> &OrderItem {
        match self {
            ItemChange::Update(item) | ItemChange::Remove(item) => item,
        }
    }
}

/// A new order to create at `location_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderSpec {
    pub location_id: LocationId,
    pub general_info: GeneralInfo,
    pub customer_info: CustomerInfo,
    pub shipping_info: ShippingInfo,
    pub lines: Vec<NewOrderLine>,
}

impl NewOrderSpec {
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// Everything the executor needs to finalize one order.
///
/// Produced without touching the gateway; the ledger has already been
/// updated for the allocations it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlan {
    pub order: Order,
    pub state: PlanState,
    pub item_changes: Vec<ItemChange>,
    /// New shipping info for the original order, when recomputed.
    pub shipping: Option<ShippingInfo>,
    pub new_orders: Vec<NewOrderSpec>,
    pub allocations: Vec<AllocationRecord>,
    pub backordered: i64,
}

impl OrderPlan {
    pub fn skipped(order: &Order, allocations: Vec<AllocationRecord>, backordered: i64) -> Self {
        Self {
            order: order.clone(),
            state: PlanState::Skipped,
            item_changes: Vec::new(),
            shipping: None,
            new_orders: Vec::new(),
            allocations,
            backordered,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.state == PlanState::Skipped
    }
}

/// `cost × part / total`, rounded to cents. A non-positive total yields zero.
pub fn apportion(cost: Decimal, part: i64, total: i64) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    (cost * Decimal::from(part) / Decimal::from(total)).round_dp(2)
}

/// `shipping` with a new cost, keeping the postal service.
pub fn with_postage(shipping: &ShippingInfo, postage_cost: Option<Decimal>) -> ShippingInfo {
    ShippingInfo {
        postal_service_id: shipping.postal_service_id,
        postage_cost,
    }
}

/// The header fields a split order inherits from its original.
pub fn inherited_general_info(order: &Order) -> GeneralInfo {
    GeneralInfo {
        status: order.general_info.status,
        source: order.general_info.source.clone(),
        sub_source: order.general_info.sub_source.clone(),
    }
}

/// A line for a split order carrying `item`'s pricing and channel sku.
pub fn split_line(item: &OrderItem, location_id: LocationId, quantity: i64) -> NewOrderLine {
    NewOrderLine {
        item_id: item.item_id,
        sku: item.sku.clone(),
        channel_sku: item.channel_sku.clone(),
        location_id,
        quantity,
        pricing: item.pricing.clone(),
    }
}
