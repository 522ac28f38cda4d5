use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroute_core::{ItemId, LocationId, OrderId, RowId};
use stockroute_inventory::StockLevelSnapshot;
use stockroute_sales::{BinRack, CustomerInfo, GeneralInfo, Order, OrderItem, ShippingInfo};

use super::r#trait::{GatewayError, LocationDirectory, NewOrderLine, OrderSink, OrderSource};

/// Seed data for an [`InMemoryGateway`], loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySnapshot {
    #[serde(default)]
    pub locations: LocationDirectory,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub stock_levels: Vec<StockLevelSnapshot>,
}

/// A note attached to an order through the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNote {
    pub order_id: OrderId,
    pub text: String,
    pub internal: bool,
}

/// Kind of a gateway call, used for failure injection and filtering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CallKind {
    FetchLocations,
    FetchOrders,
    FetchStockLevels,
    CreateOrder,
    SetGeneralInfo,
    SetShippingInfo,
    SetCustomerInfo,
    AddOrderItem,
    UpdateOrderItem,
    RemoveOrderItem,
    AddOrderNote,
}

impl CallKind {
    pub fn is_mutation(self) -> bool {
        !matches!(
            self,
            CallKind::FetchLocations | CallKind::FetchOrders | CallKind::FetchStockLevels
        )
    }
}

/// One recorded call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    FetchLocations,
    FetchOrders {
        order_ids: Vec<OrderId>,
    },
    FetchStockLevels {
        item_ids: Vec<ItemId>,
    },
    CreateOrder {
        location_id: LocationId,
    },
    SetGeneralInfo {
        order_id: OrderId,
    },
    SetShippingInfo {
        order_id: OrderId,
        postage_cost: Option<Decimal>,
    },
    SetCustomerInfo {
        order_id: OrderId,
    },
    AddOrderItem {
        order_id: OrderId,
        item_id: ItemId,
        location_id: LocationId,
        quantity: i64,
    },
    UpdateOrderItem {
        order_id: OrderId,
        row_id: RowId,
        quantity: i64,
    },
    RemoveOrderItem {
        order_id: OrderId,
        row_id: RowId,
    },
    AddOrderNote {
        order_id: OrderId,
        internal: bool,
    },
}

impl GatewayCall {
    pub fn kind(&self) -> CallKind {
        match self {
            GatewayCall::FetchLocations => CallKind::FetchLocations,
            GatewayCall::FetchOrders { .. } => CallKind::FetchOrders,
            GatewayCall::FetchStockLevels { .. } => CallKind::FetchStockLevels,
            GatewayCall::CreateOrder { .. } => CallKind::CreateOrder,
            GatewayCall::SetGeneralInfo { .. } => CallKind::SetGeneralInfo,
            GatewayCall::SetShippingInfo { .. } => CallKind::SetShippingInfo,
            GatewayCall::SetCustomerInfo { .. } => CallKind::SetCustomerInfo,
            GatewayCall::AddOrderItem { .. } => CallKind::AddOrderItem,
            GatewayCall::UpdateOrderItem { .. } => CallKind::UpdateOrderItem,
            GatewayCall::RemoveOrderItem { .. } => CallKind::RemoveOrderItem,
            GatewayCall::AddOrderNote { .. } => CallKind::AddOrderNote,
        }
    }

    pub fn is_mutation(&self) -> bool {
        self.kind().is_mutation()
    }
}

#[derive(Debug, Default)]
struct State {
    locations: LocationDirectory,
    orders: Vec<Order>,
    created: Vec<OrderId>,
    stock_levels: Vec<StockLevelSnapshot>,
    notes: Vec<OrderNote>,
    calls: Vec<GatewayCall>,
    failures: Vec<(CallKind, GatewayError)>,
}

impl State {
    fn order_mut(&mut self, order_id: OrderId) -> Result<&mut Order, GatewayError> {
        self.orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| GatewayError::NotFound(format!("order {order_id}")))
    }

    fn next_num_order_id(&self) -> i64 {
        self.orders.iter().map(|o| o.num_order_id).max().unwrap_or(1000) + 1
    }
}

/// In-memory order system.
///
/// Intended for tests and the CLI's snapshot mode. Records every call so
/// callers can assert on exactly what was sent, and can be told to fail
/// every call of a given kind.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: RwLock<State>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: GatewaySnapshot) -> Self {
        Self {
            state: RwLock::new(State {
                locations: snapshot.locations,
                orders: snapshot.orders,
                stock_levels: snapshot.stock_levels,
                ..State::default()
            }),
        }
    }

    pub fn with_location(self, location_id: LocationId, name: impl Into<String>) -> Self {
        let name = name.into();
        self.edit(|state| {
            state.locations.insert(location_id, name);
        })
    }

    pub fn with_order(self, order: Order) -> Self {
        self.edit(|state| state.orders.push(order))
    }

    pub fn with_stock_levels(self, snapshot: StockLevelSnapshot) -> Self {
        self.edit(|state| state.stock_levels.push(snapshot))
    }

    /// Make every later call of `kind` fail with `error`.
    pub fn fail_on(self, kind: CallKind, error: GatewayError) -> Self {
        self.edit(|state| state.failures.push((kind, error)))
    }

    fn edit(mut self, f: impl FnOnce(&mut State)) -> Self {
        f(self.state.get_mut().unwrap_or_else(PoisonError::into_inner));
        self
    }

    /// Record `call`, then hand back the locked state unless a failure was
    /// injected for its kind.
    fn record(&self, call: GatewayCall) -> Result<RwLockWriteGuard<'_, State>, GatewayError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| GatewayError::Unavailable("lock poisoned".to_string()))?;

        let kind = call.kind();
        state.calls.push(call);
        if let Some((_, error)) = state.failures.iter().find(|(k, _)| *k == kind) {
            return Err(error.clone());
        }
        Ok(state)
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.read(|state| state.calls.clone())
    }

    /// Number of mutating calls attempted so far.
    pub fn mutation_count(&self) -> usize {
        self.read(|state| state.calls.iter().filter(|c| c.is_mutation()).count())
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.read(|state| state.orders.iter().find(|o| o.order_id == order_id).cloned())
    }

    pub fn orders(&self) -> Vec<Order> {
        self.read(|state| state.orders.clone())
    }

    /// Orders created through the sink, in creation order.
    pub fn created_orders(&self) -> Vec<Order> {
        self.read(|state| {
            state
                .created
                .iter()
                .filter_map(|id| state.orders.iter().find(|o| o.order_id == *id).cloned())
                .collect()
        })
    }

    pub fn notes_for(&self, order_id: OrderId) -> Vec<OrderNote> {
        self.read(|state| {
            state
                .notes
                .iter()
                .filter(|n| n.order_id == order_id)
                .cloned()
                .collect()
        })
    }
}

impl OrderSource for InMemoryGateway {
    fn fetch_locations(&self) -> Result<LocationDirectory, GatewayError> {
        let state = self.record(GatewayCall::FetchLocations)?;
        Ok(state.locations.clone())
    }

    fn fetch_orders_by_id(&self, order_ids: &[OrderId]) -> Result<Vec<Order>, GatewayError> {
        let state = self.record(GatewayCall::FetchOrders {
            order_ids: order_ids.to_vec(),
        })?;
        Ok(order_ids
            .iter()
            .filter_map(|id| state.orders.iter().find(|o| o.order_id == *id).cloned())
            .collect())
    }

    fn fetch_stock_levels_batch(&self, item_ids: &[ItemId]) -> Result<Vec<StockLevelSnapshot>, GatewayError> {
        let state = self.record(GatewayCall::FetchStockLevels {
            item_ids: item_ids.to_vec(),
        })?;
        Ok(item_ids
            .iter()
            .filter_map(|id| state.stock_levels.iter().find(|s| s.item_id == *id).cloned())
            .collect())
    }
}

impl OrderSink for InMemoryGateway {
    fn create_order(&self, location_id: LocationId) -> Result<Order, GatewayError> {
        let mut state = self.record(GatewayCall::CreateOrder { location_id })?;
        let order = Order::empty(OrderId::new(), state.next_num_order_id(), location_id);
        state.created.push(order.order_id);
        state.orders.push(order.clone());
        Ok(order)
    }

    fn set_order_general_info(&self, order_id: OrderId, info: &GeneralInfo) -> Result<(), GatewayError> {
        let mut state = self.record(GatewayCall::SetGeneralInfo { order_id })?;
        state.order_mut(order_id)?.general_info = info.clone();
        Ok(())
    }

    fn set_order_shipping_info(&self, order_id: OrderId, info: &ShippingInfo) -> Result<(), GatewayError> {
        let mut state = self.record(GatewayCall::SetShippingInfo {
            order_id,
            postage_cost: info.postage_cost,
        })?;
        state.order_mut(order_id)?.shipping_info = info.clone();
        Ok(())
    }

    fn set_order_customer_info(&self, order_id: OrderId, info: &CustomerInfo) -> Result<(), GatewayError> {
        let mut state = self.record(GatewayCall::SetCustomerInfo { order_id })?;
        state.order_mut(order_id)?.customer_info = info.clone();
        Ok(())
    }

    fn add_order_item(&self, order_id: OrderId, line: &NewOrderLine) -> Result<(), GatewayError> {
        let mut state = self.record(GatewayCall::AddOrderItem {
            order_id,
            item_id: line.item_id,
            location_id: line.location_id,
            quantity: line.quantity,
        })?;
        if line.quantity <= 0 {
            return Err(GatewayError::Rejected(format!(
                "line quantity must be positive (got {})",
                line.quantity
            )));
        }

        state.order_mut(order_id)?.items.push(OrderItem {
            row_id: RowId::new(),
            item_id: line.item_id,
            sku: line.sku.clone(),
            channel_sku: line.channel_sku.clone(),
            quantity: line.quantity,
            pricing: line.pricing.clone(),
            bin_racks: vec![BinRack::new(line.location_id, line.quantity)],
        });
        Ok(())
    }

    fn update_order_item(
        &self,
        order_id: OrderId,
        item: &OrderItem,
        _fulfilment_location_id: LocationId,
        _general_info: &GeneralInfo,
    ) -> Result<(), GatewayError> {
        let mut state = self.record(GatewayCall::UpdateOrderItem {
            order_id,
            row_id: item.row_id,
            quantity: item.quantity,
        })?;
        let order = state.order_mut(order_id)?;
        let existing = order
            .items
            .iter_mut()
            .find(|i| i.row_id == item.row_id)
            .ok_or_else(|| GatewayError::NotFound(format!("row {} on order {order_id}", item.row_id)))?;
        *existing = item.clone();
        Ok(())
    }

    fn remove_order_item(
        &self,
        order_id: OrderId,
        row_id: RowId,
        _fulfilment_location_id: LocationId,
    ) -> Result<(), GatewayError> {
        let mut state = self.record(GatewayCall::RemoveOrderItem { order_id, row_id })?;
        let order = state.order_mut(order_id)?;
        let before = order.items.len();
        order.items.retain(|i| i.row_id != row_id);
        if order.items.len() == before {
            return Err(GatewayError::NotFound(format!("row {row_id} on order {order_id}")));
        }
        Ok(())
    }

    fn add_order_note(&self, order_id: OrderId, text: &str, internal: bool) -> Result<(), GatewayError> {
        let mut state = self.record(GatewayCall::AddOrderNote { order_id, internal })?;
        state.order_mut(order_id)?;
        state.notes.push(OrderNote {
            order_id,
            text: text.to_string(),
            internal,
        });
        Ok(())
    }
}
