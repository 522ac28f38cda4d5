use std::collections::HashMap;

use stockroute_allocation::{AllocationAggregator, BinRackAllocations, DemandLine};
use stockroute_core::{DomainResult, ItemId};
use stockroute_inventory::{BackorderAvailabilityDetail, StockLedger};
use stockroute_sales::Order;

use super::plan::{apportion, inherited_general_info, split_line, with_postage, ItemChange, NewOrderSpec, OrderPlan, PlanState};
use super::OrderReallocationPlanner;
use crate::gateway::NewOrderLine;

impl OrderReallocationPlanner<'_> {
    pub(super) fn plan_order_split(
        &self,
        ledger: &mut StockLedger,
        aggregator: &mut AllocationAggregator,
        order: &Order,
    ) -> DomainResult<OrderPlan> {
        let primary = self.ctx.primary_location_id();
        let alternates = self.ctx.alternate_location_ids();
        let mut allocations = Vec::new();
        let mut backordered = 0;

        for item in &order.items {
            let position = ledger.position(item.item_id, primary)?;
            if !position.is_short() {
                tracing::debug!(
                    order = %order.label(),
                    sku = %item.sku,
                    available = position.running_available(),
                    "line is not short at primary"
                );
                continue;
            }

            let detail = BackorderAvailabilityDetail::from_ledger(ledger, item.item_id, primary, alternates)?;
            let quantity = detail.demand_for(item.quantity);
            if quantity == 0 {
                continue;
            }

            let demand = DemandLine::whole_line(order.order_id, item.item_id, primary, quantity);
            let mut bin_racks = BinRackAllocations::new(item.item_id);
            let outcome = self.allocator.allocate(ledger, &demand, alternates, &mut bin_racks)?;
            tracing::debug!(
                order = %order.label(),
                sku = %item.sku,
                shortfall = detail.quantity(),
                alternates_available = detail.total_alternate_available(),
                covered = detail.alternates_cover_shortfall(),
                allocated = outcome.allocated(),
                backorder = outcome.backorder,
                "shortfall allocated"
            );

            aggregator.for_order(order).add(item, &outcome.per_location());
            backordered += outcome.backorder;
            allocations.extend(outcome.allocations);
        }

        let Some(aggregate) = aggregator.get(order.order_id).filter(|a| !a.is_empty()) else {
            return Ok(OrderPlan::skipped(order, allocations, backordered));
        };

        let fulfilment = order.fulfilment_location_id;
        let total = order.total_quantity();
        let recomputed_cost = order
            .shipping_info
            .postage_cost
            .filter(|_| self.ctx.config().recompute_shipping_cost_on_split);

        let mut to_move: HashMap<ItemId, i64> = HashMap::new();
        let mut new_orders = Vec::new();
        for location_id in aggregate.locations_used_excluding(fulfilment) {
            let lines: Vec<NewOrderLine> = aggregate
                .items_for_location(location_id)
                .into_iter()
                .filter_map(|(item_id, quantity)| {
                    *to_move.entry(item_id).or_insert(0) += quantity;
                    aggregate
                        .order_item(item_id)
                        .map(|item| split_line(item, location_id, quantity))
                })
                .collect();
            if lines.is_empty() {
                continue;
            }

            let share: i64 = lines.iter().map(|l| l.quantity).sum();
            new_orders.push(NewOrderSpec {
                location_id,
                general_info: inherited_general_info(order),
                customer_info: order.customer_info.clone(),
                shipping_info: with_postage(&order.shipping_info, recomputed_cost.map(|cost| apportion(cost, share, total))),
                lines,
            });
        }

        if new_orders.is_empty() {
            return Ok(OrderPlan::skipped(order, allocations, backordered));
        }

        // Lines of the same item are drained in order; the stock was released
        // at the fulfilment location, so its bin-racks give first.
        let mut remaining_total = 0;
        let mut item_changes = Vec::new();
        for item in &order.items {
            let left = to_move.entry(item.item_id).or_insert(0);
            let taken = (*left).min(item.quantity.max(0));
            remaining_total += item.quantity - taken;
            if taken == 0 {
                continue;
            }
            *left -= taken;
            item_changes.push(ItemChange::for_item(item.reduced_at(fulfilment, taken)));
        }

        Ok(OrderPlan {
            order: order.clone(),
            state: PlanState::PlanningSplits,
            item_changes,
            shipping: recomputed_cost
                .map(|cost| with_postage(&order.shipping_info, Some(apportion(cost, remaining_total, total)))),
            new_orders,
            allocations,
            backordered,
        })
    }
}
