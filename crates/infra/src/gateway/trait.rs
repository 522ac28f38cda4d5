use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroute_core::{ItemId, LocationId, OrderId, RowId};
use stockroute_inventory::StockLevelSnapshot;
use stockroute_sales::{CustomerInfo, GeneralInfo, LinePricing, Order, OrderItem, ShippingInfo};

/// Location id → display name, as reported by the order system.
pub type LocationDirectory = BTreeMap<LocationId, String>;

/// A line to add to a freshly created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub item_id: ItemId,
    pub sku: String,
    pub channel_sku: String,
    pub location_id: LocationId,
    pub quantity: i64,
    pub pricing: LinePricing,
}

/// Failure reported by the external order system.
///
/// These are **collaborator errors** (transport, remote validation) as opposed
/// to domain errors raised by the allocation core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected by order system: {0}")]
    Rejected(String),

    #[error("order system unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the external order system.
///
/// ## Semantics
///
/// - `fetch_orders_by_id` returns the orders it knows, in request order;
///   unknown ids are silently absent.
/// - `fetch_stock_levels_batch` returns one snapshot per known item; the
///   levels inside may omit locations (treated as empty by the ledger).
///
/// Implementations must be shareable across threads; the run itself is
/// single-threaded.
pub trait OrderSource: Send + Sync {
    fn fetch_locations(&self) -> Result<LocationDirectory, GatewayError>;

    fn fetch_orders_by_id(&self, order_ids: &[OrderId]) -> Result<Vec<Order>, GatewayError>;

    fn fetch_stock_levels_batch(&self, item_ids: &[ItemId]) -> Result<Vec<StockLevelSnapshot>, GatewayError>;
}

/// Write side of the external order system.
///
/// Every call is a remote side effect. Nothing is transactional across calls:
/// a failure part-way through an order leaves earlier calls applied.
pub trait OrderSink: Send + Sync {
    /// Create an empty order at `location_id` and return it (with its new ids).
    fn create_order(&self, location_id: LocationId) -> Result<Order, GatewayError>;

    fn set_order_general_info(&self, order_id: OrderId, info: &GeneralInfo) -> Result<(), GatewayError>;

    fn set_order_shipping_info(&self, order_id: OrderId, info: &ShippingInfo) -> Result<(), GatewayError>;

    fn set_order_customer_info(&self, order_id: OrderId, info: &CustomerInfo) -> Result<(), GatewayError>;

    fn add_order_item(&self, order_id: OrderId, line: &NewOrderLine) -> Result<(), GatewayError>;

    /// Replace an existing line (matched by `row_id`) with `item`.
    fn update_order_item(
        &self,
        order_id: OrderId,
        item: &OrderItem,
        fulfilment_location_id: LocationId,
        general_info: &GeneralInfo,
    ) -> Result<(), GatewayError>;

    fn remove_order_item(
        &self,
        order_id: OrderId,
        row_id: RowId,
        fulfilment_location_id: LocationId,
    ) -> Result<(), GatewayError>;

    fn add_order_note(&self, order_id: OrderId, text: &str, internal: bool) -> Result<(), GatewayError>;
}

impl<S> OrderSource for Arc<S>
where
    S: OrderSource + ?Sized,
{
    fn fetch_locations(&self) -> Result<LocationDirectory, GatewayError> {
        (**self).fetch_locations()
    }

    fn fetch_orders_by_id(&self, order_ids: &[OrderId]) -> Result<Vec<Order>, GatewayError> {
        (**self).fetch_orders_by_id(order_ids)
    }

    fn fetch_stock_levels_batch(&self, item_ids: &[ItemId]) -> Result<Vec<StockLevelSnapshot>, GatewayError> {
        (**self).fetch_stock_levels_batch(item_ids)
    }
}

impl<S> OrderSink for Arc<S>
where
    S: OrderSink + ?Sized,
{
    fn create_order(&self, location_id: LocationId) -> Result<Order, GatewayError> {
        (**self).create_order(location_id)
    }

    fn set_order_general_info(&self, order_id: OrderId, info: &GeneralInfo) -> Result<(), GatewayError> {
        (**self).set_order_general_info(order_id, info)
    }

    fn set_order_shipping_info(&self, order_id: OrderId, info: &ShippingInfo) -> Result<(), GatewayError> {
        (**self).set_order_shipping_info(order_id, info)
    }

    fn set_order_customer_info(&self, order_id: OrderId, info: &CustomerInfo) -> Result<(), GatewayError> {
        (**self).set_order_customer_info(order_id, info)
    }

    fn add_order_item(&self, order_id: OrderId, line: &NewOrderLine) -> Result<(), GatewayError> {
        (**self).add_order_item(order_id, line)
    }

    fn update_order_item(
        &self,
        order_id: OrderId,
        item: &OrderItem,
        fulfilment_location_id: LocationId,
        general_info: &GeneralInfo,
    ) -> Result<(), GatewayError> {
        (**self).update_order_item(order_id, item, fulfilment_location_id, general_info)
    }

    fn remove_order_item(
        &self,
        order_id: OrderId,
        row_id: RowId,
        fulfilment_location_id: LocationId,
    ) -> Result<(), GatewayError> {
        (**self).remove_order_item(order_id, row_id, fulfilment_location_id)
    }

    fn add_order_note(&self, order_id: OrderId, text: &str, internal: bool) -> Result<(), GatewayError> {
        (**self).add_order_note(order_id, text, internal)
    }
}
