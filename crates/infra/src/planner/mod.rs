//! Per-order reallocation planning.
//!
//! Each fetched order is evaluated against the shared ledger and turned into an
//! [`OrderPlan`]:
//!
//! ```text
//! Fetched -> Evaluated -> Skipped | RewritingInPlace | PlanningSplits -> Finalized
//! ```
//!
//! Planning is pure with respect to the gateway; finalization is the
//! executor's job.

mod context;
mod plan;
mod rewrite;
mod split;

pub use context::RunContext;
pub use plan::{
    apportion, inherited_general_info, split_line, with_postage, ItemChange, NewOrderSpec, OrderPlan, PlanState,
};

use stockroute_allocation::{AllocationAggregator, WaterfallAllocator};
use stockroute_core::DomainResult;
use stockroute_inventory::StockLedger;
use stockroute_sales::Order;

use crate::config::ReallocationStrategy;

/// Evaluates orders one at a time against a run's ledger.
#[derive(Debug, Clone, Copy)]
pub struct OrderReallocationPlanner<'a> {
    ctx: &'a RunContext,
    allocator: WaterfallAllocator,
}

impl<'a> OrderReallocationPlanner<'a> {
    pub fn new(ctx: &'a RunContext) -> Self {
        Self {
            ctx,
            allocator: WaterfallAllocator::new(ctx.config().policy),
        }
    }

    /// Allocate `order` against `ledger` and describe the resulting changes.
    ///
    /// Allocations are committed to the ledger even when the plan ends up
    /// `Skipped`, so later orders see the stock this one consumed.
    pub fn plan(
        &self,
        ledger: &mut StockLedger,
        aggregator: &mut AllocationAggregator,
        order: &Order,
    ) -> DomainResult<OrderPlan> {
        let plan = match self.ctx.config().strategy {
            ReallocationStrategy::RewriteBinRacks => self.plan_bin_rack_rewrite(ledger, aggregator, order)?,
            ReallocationStrategy::SplitOrders => self.plan_order_split(ledger, aggregator, order)?,
        };

        tracing::debug!(
            order = %order.label(),
            state = ?plan.state,
            new_orders = plan.new_orders.len(),
            item_changes = plan.item_changes.len(),
            backordered = plan.backordered,
            "order evaluated"
        );
        Ok(plan)
    }
}
