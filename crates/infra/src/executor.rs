//! Finalization of order plans against the order sink.
//!
//! ```text
//! OrderPlan
//!   ↓
//! 1. Create each split order (create, general, shipping, customer info, lines)
//!   ↓
//! 2. Update / remove the original order's lines
//!   ↓
//! 3. Set the original's shipping info (when recomputed)
//!   ↓
//! 4. Cross-reference notes on both sides of every split
//! ```
//!
//! Calls are not transactional. The first failing call stops the order and
//! earlier calls stay applied.

use serde::{Deserialize, Serialize};

use stockroute_core::{LocationId, OrderId};

use crate::gateway::{GatewayError, OrderSink};
use crate::planner::{ItemChange, OrderPlan, RunContext};

/// An order created by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub num_order_id: i64,
    pub location_id: LocationId,
    pub quantity: i64,
}

impl CreatedOrder {
    pub fn label(&self) -> String {
        format!("{} ({})", self.num_order_id, self.order_id)
    }
}

/// What the executor sent for one plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPlan {
    pub created: Vec<CreatedOrder>,
    pub items_updated: usize,
    pub items_removed: usize,
    pub shipping_updated: bool,
}

/// Applies [`OrderPlan`]s through an [`OrderSink`].
pub struct PlanExecutor<'a, K> {
    sink: &'a K,
    ctx: &'a RunContext,
}

impl<'a, K> PlanExecutor<'a, K>
where
    K: OrderSink,
{
    pub fn new(sink: &'a K, ctx: &'a RunContext) -> Self {
        Self { sink, ctx }
    }

    pub fn apply(&self, plan: &OrderPlan) -> Result<AppliedPlan, GatewayError> {
        let mut applied = AppliedPlan::default();
        if plan.is_skipped() {
            return Ok(applied);
        }

        let order = &plan.order;

        // 1) Split orders
        for spec in &plan.new_orders {
            let created = self.sink.create_order(spec.location_id)?;
            self.sink.set_order_general_info(created.order_id, &spec.general_info)?;
            self.sink.set_order_shipping_info(created.order_id, &spec.shipping_info)?;
            self.sink.set_order_customer_info(created.order_id, &spec.customer_info)?;
            for line in &spec.lines {
                self.sink.add_order_item(created.order_id, line)?;
            }

            tracing::info!(
                order = %order.label(),
                new_order = %created.label(),
                location = %self.ctx.location_name(spec.location_id),
                quantity = spec.total_quantity(),
                "created split order"
            );
            applied.created.push(CreatedOrder {
                order_id: created.order_id,
                num_order_id: created.num_order_id,
                location_id: spec.location_id,
                quantity: spec.total_quantity(),
            });
        }

        // 2) Original lines
        for change in &plan.item_changes {
            match change {
                ItemChange::Update(item) => {
                    self.sink
                        .update_order_item(order.order_id, item, order.fulfilment_location_id, &order.general_info)?;
                    applied.items_updated += 1;
                }
                ItemChange::Remove(item) => {
                    self.sink
                        .remove_order_item(order.order_id, item.row_id, order.fulfilment_location_id)?;
                    applied.items_removed += 1;
                }
            }
        }

        // 3) Original shipping
        if let Some(shipping) = &plan.shipping {
            self.sink.set_order_shipping_info(order.order_id, shipping)?;
            applied.shipping_updated = true;
        }

        // 4) Notes
        let fulfilment_name = self.ctx.location_name(order.fulfilment_location_id);
        for created in &applied.created {
            self.sink.add_order_note(
                order.order_id,
                &format!(
                    "Created new order {} to reallocate backorders to {}",
                    created.label(),
                    self.ctx.location_name(created.location_id)
                ),
                true,
            )?;
            self.sink.add_order_note(
                created.order_id,
                &format!(
                    "This order is reallocated based on order {} from {fulfilment_name}",
                    order.label()
                ),
                true,
            )?;
        }

        Ok(applied)
    }
}
