use std::collections::BTreeMap;

use stockroute_allocation::{AllocationAggregate, AllocationAggregator, BinRackAllocations, DemandLine};
use stockroute_core::{DomainResult, LocationId};
use stockroute_inventory::StockLedger;
use stockroute_sales::{Order, OrderItem};

use super::plan::{apportion, inherited_general_info, split_line, with_postage, ItemChange, NewOrderSpec, OrderPlan, PlanState};
use super::OrderReallocationPlanner;
use crate::config::ReallocationMode;
use crate::gateway::NewOrderLine;

/// Non-zero quantity per location.
fn location_totals(pairs: impl IntoIterator<Item = (LocationId, i64)>) -> BTreeMap<LocationId, i64> {
    let mut totals = BTreeMap::new();
    for (location_id, quantity) in pairs {
        *totals.entry(location_id).or_insert(0) += quantity;
    }
    totals.retain(|_, quantity| *quantity != 0);
    totals
}

impl OrderReallocationPlanner<'_> {
    pub(super) fn plan_bin_rack_rewrite(
        &self,
        ledger: &mut StockLedger,
        aggregator: &mut AllocationAggregator,
        order: &Order,
    ) -> DomainResult<OrderPlan> {
        let candidates = self.ctx.candidates();
        let mut rewritten: Vec<(&OrderItem, BinRackAllocations)> = Vec::with_capacity(order.items.len());
        let mut allocations = Vec::new();
        let mut backordered = 0;
        let mut changed = false;

        for item in &order.items {
            let demands = DemandLine::per_bin_rack(order, item);
            let before = location_totals(demands.iter().map(|d| (d.source_location_id, d.quantity)));

            let mut bin_racks = BinRackAllocations::new(item.item_id);
            for demand in &demands {
                let outcome = self.allocator.allocate(ledger, demand, &candidates, &mut bin_racks)?;
                tracing::debug!(
                    order = %order.label(),
                    sku = %item.sku,
                    bin_rack = ?demand.bin_rack_index,
                    demand = outcome.demand,
                    allocated = outcome.allocated(),
                    backorder = outcome.backorder,
                    "bin-rack allocated"
                );
                backordered += outcome.backorder;
                allocations.extend(outcome.allocations);
            }

            let by_location = bin_racks.quantities_by_location();
            aggregator.for_order(order).add(item, &by_location);
            changed |= location_totals(by_location) != before;
            rewritten.push((item, bin_racks));
        }

        if !changed {
            return Ok(OrderPlan::skipped(order, allocations, backordered));
        }

        let mut plan = match self.ctx.config().mode {
            ReallocationMode::InPlaceOnly => Self::rewrite_in_place(order, &rewritten),
            ReallocationMode::InPlaceWithSplitOrders => {
                self.rewrite_with_splits(order, aggregator.for_order(order), &rewritten)
            }
        };
        plan.allocations = allocations;
        plan.backordered = backordered;
        Ok(plan)
    }

    /// Keep every bin-rack on the original order, wherever it landed.
    fn rewrite_in_place(order: &Order, rewritten: &[(&OrderItem, BinRackAllocations)]) -> OrderPlan {
        let mut kept = 0;
        let mut item_changes = Vec::new();
        for (item, bin_racks) in rewritten {
            let updated = item.with_bin_racks(bin_racks.bin_racks());
            kept += updated.quantity;
            if updated != **item {
                item_changes.push(ItemChange::for_item(updated));
            }
        }

        OrderPlan {
            state: PlanState::RewritingInPlace,
            item_changes,
            shipping: order
                .shipping_info
                .postage_cost
                .map(|cost| with_postage(&order.shipping_info, Some(apportion(cost, kept, order.total_quantity())))),
            ..OrderPlan::skipped(order, Vec::new(), 0)
        }
    }

    /// Move every non-fulfilment location's share into a new order.
    fn rewrite_with_splits(
        &self,
        order: &Order,
        aggregate: &AllocationAggregate,
        rewritten: &[(&OrderItem, BinRackAllocations)],
    ) -> OrderPlan {
        let fulfilment = order.fulfilment_location_id;
        let all_quantity = aggregate.total_allocated();
        let split_cost = order
            .shipping_info
            .postage_cost
            .filter(|_| self.ctx.config().recompute_shipping_cost_on_split);

        let new_orders: Vec<NewOrderSpec> = aggregate
            .locations_used_excluding(fulfilment)
            .into_iter()
            .filter_map(|location_id| {
                let lines: Vec<NewOrderLine> = aggregate
                    .items_for_location(location_id)
                    .into_iter()
                    .filter_map(|(item_id, quantity)| {
                        aggregate
                            .order_item(item_id)
                            .map(|item| split_line(item, location_id, quantity))
                    })
                    .collect();
                if lines.is_empty() {
                    return None;
                }

                let share: i64 = lines.iter().map(|l| l.quantity).sum();
                Some(NewOrderSpec {
                    location_id,
                    general_info: inherited_general_info(order),
                    customer_info: order.customer_info.clone(),
                    shipping_info: with_postage(
                        &order.shipping_info,
                        split_cost.map(|cost| apportion(cost, share, all_quantity)),
                    ),
                    lines,
                })
            })
            .collect();

        let mut original_share = 0;
        let mut item_changes = Vec::new();
        for (item, bin_racks) in rewritten {
            let kept = item.with_bin_racks(bin_racks.bin_racks_at(fulfilment));
            original_share += kept.quantity;
            if kept != **item {
                item_changes.push(ItemChange::for_item(kept));
            }
        }

        let state = if new_orders.is_empty() {
            PlanState::RewritingInPlace
        } else {
            PlanState::PlanningSplits
        };
        OrderPlan {
            state,
            item_changes,
            shipping: order
                .shipping_info
                .postage_cost
                .map(|cost| with_postage(&order.shipping_info, Some(apportion(cost, original_share, all_quantity)))),
            new_orders,
            ..OrderPlan::skipped(order, Vec::new(), 0)
        }
    }
}
