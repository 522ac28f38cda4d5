use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroute_core::{Entity, ItemId, LocationId, OrderId, PostalServiceId, RowId, ValueObject};

/// Order status as reported by the order source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Unpaid,
    #[default]
    Paid,
    Resend,
    Pending,
}

/// General order header fields copied onto split orders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneralInfo {
    pub status: OrderStatus,
    pub source: String,
    pub sub_source: String,
}

/// Customer details; carried over verbatim to split orders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub town: String,
    pub region: String,
    pub postcode: String,
    pub country: String,
}

/// Shipping method and cost.
///
/// `postage_cost` is `None` when a split order is created without a recomputed
/// cost and the downstream system is left to price it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub postal_service_id: Option<PostalServiceId>,
    pub postage_cost: Option<Decimal>,
}

/// Per-unit pricing carried by an order line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinePricing {
    pub unit_price: Decimal,
    /// Discount percentage.
    pub discount: Decimal,
    /// Tax rate percentage.
    pub tax_rate: Decimal,
    pub tax_inclusive: bool,
}

impl ValueObject for LinePricing {}

/// A (location, quantity) split of one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinRack {
    pub location_id: LocationId,
    pub quantity: i64,
}

impl BinRack {
    pub fn new(location_id: LocationId, quantity: i64) -> Self {
        Self {
            location_id,
            quantity,
        }
    }
}

impl ValueObject for BinRack {}

/// One order line.
///
/// `quantity` and `bin_racks` are the only fields the allocation core rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub row_id: RowId,
    pub item_id: ItemId,
    pub sku: String,
    pub channel_sku: String,
    pub quantity: i64,
    pub pricing: LinePricing,
    #[serde(default)]
    pub bin_racks: Vec<BinRack>,
}

impl OrderItem {
    pub fn bin_rack_quantity(&self) -> i64 {
        self.bin_racks.iter().map(|br| br.quantity).sum()
    }

    /// Replace the bin-racks and set the quantity to their sum.
    pub fn with_bin_racks(&self, bin_racks: Vec<BinRack>) -> Self {
        let mut item = self.clone();
        item.quantity = bin_racks.iter().map(|br| br.quantity).sum();
        item.bin_racks = bin_racks;
        item
    }

    /// Copy of this line with no quantity and no bin-racks.
    pub fn cleared(&self) -> Self {
        Self {
            quantity: 0,
            bin_racks: Vec::new(),
            ..self.clone()
        }
    }

    /// Copy of this line with `quantity` taken off.
    ///
    /// Bin-racks at `location_id` are drained first, last one backwards; any
    /// rest comes off the other bin-racks in the same order. Emptied bin-racks
    /// are dropped.
    pub fn reduced_at(&self, location_id: LocationId, quantity: i64) -> Self {
        let mut item = self.clone();
        let taken = quantity.clamp(0, item.quantity.max(0));
        item.quantity -= taken;

        let mut left = taken;
        for at_location in [true, false] {
            for br in item.bin_racks.iter_mut().rev() {
                if left == 0 {
                    break;
                }
                if (br.location_id == location_id) != at_location {
                    continue;
                }
                let step = left.min(br.quantity.max(0));
                br.quantity -= step;
                left -= step;
            }
        }
        item.bin_racks.retain(|br| br.quantity > 0);
        item
    }
}

impl Entity for OrderItem {
    type Id = RowId;

    fn id(&self) -> &Self::Id {
        &self.row_id
    }
}

/// Order snapshot as supplied by the order source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    /// Human-facing order number.
    pub num_order_id: i64,
    pub fulfilment_location_id: LocationId,
    #[serde(default)]
    pub general_info: GeneralInfo,
    #[serde(default)]
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub shipping_info: ShippingInfo,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// A fresh, empty order at `location_id` (what the sink hands back on create).
    pub fn empty(order_id: OrderId, num_order_id: i64, location_id: LocationId) -> Self {
        Self {
            order_id,
            num_order_id,
            fulfilment_location_id: location_id,
            general_info: GeneralInfo::default(),
            customer_info: CustomerInfo::default(),
            shipping_info: ShippingInfo::default(),
            items: Vec::new(),
        }
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Short label used in logs and audit notes: `"{num} ({id})"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.num_order_id, self.order_id)
    }

    pub fn item(&self, item_id: ItemId) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.order_id
    }
}
