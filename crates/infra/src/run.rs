//! One end-to-end reallocation run.
//!
//! ```text
//! RunRequest
//!   ↓
//! 1. Fetch locations, validate alternates
//!   ↓
//! 2. Fetch orders, keep the eligible ones
//!   ↓
//! 3. Fetch stock levels (one batch), seed the ledger
//!   ↓
//! 4. Per order: plan (allocate against the shared ledger), then apply
//! ```
//!
//! Business short-circuits (nothing requested, no alternates, nothing found)
//! end the run early without any mutation. Any error ends the run at the
//! order it happened on; writes already sent are kept.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use stockroute_allocation::{AllocationAggregator, AllocationRecord};
use stockroute_core::{DomainError, ItemId, LocationId, OrderId};
use stockroute_inventory::StockLedger;
use stockroute_sales::Order;

use crate::config::{ReallocationConfig, RunRequest};
use crate::executor::{AppliedPlan, CreatedOrder, PlanExecutor};
use crate::gateway::{GatewayError, OrderSink, OrderSource};
use crate::planner::{OrderPlan, OrderReallocationPlanner, PlanState, RunContext};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("order system error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Why a run stopped before touching any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortCircuit {
    NoOrderIds,
    NoAlternateLocations,
    NoOrdersFound,
    NoEligibleOrders,
    NoStockLevels,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    ShortCircuited { reason: ShortCircuit },
    Aborted { error: String },
}

/// Per-order line of the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReport {
    pub order_id: OrderId,
    pub num_order_id: i64,
    pub state: PlanState,
    pub allocations: Vec<AllocationRecord>,
    pub backordered: i64,
    pub created_orders: Vec<CreatedOrder>,
    pub items_updated: usize,
    pub items_removed: usize,
}

impl OrderReport {
    fn new(plan: &OrderPlan, applied: AppliedPlan) -> Self {
        Self {
            order_id: plan.order.order_id,
            num_order_id: plan.order.num_order_id,
            state: plan.state,
            allocations: plan.allocations.clone(),
            backordered: plan.backordered,
            created_orders: applied.created,
            items_updated: applied.items_updated,
            items_removed: applied.items_removed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: RunOutcome,
    pub primary_location_id: LocationId,
    /// Alternates that survived validation.
    pub alternate_location_ids: Vec<LocationId>,
    /// Orders that reached finalization, in processing order.
    pub orders: Vec<OrderReport>,
}

impl RunReport {
    fn new(request: &RunRequest) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            outcome: RunOutcome::Completed,
            primary_location_id: request.primary_location_id(),
            alternate_location_ids: Vec::new(),
            orders: Vec::new(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted { .. })
    }

    pub fn total_allocated(&self) -> i64 {
        self.orders
            .iter()
            .flat_map(|o| o.allocations.iter())
            .map(|a| a.quantity)
            .sum()
    }

    pub fn created_orders(&self) -> impl Iterator<Item = &CreatedOrder> {
        self.orders.iter().flat_map(|o| o.created_orders.iter())
    }
}

/// Reallocation run over an order source and sink.
///
/// The source and sink are usually the same gateway shared through `Arc`.
pub struct ReallocationRun<S, K> {
    source: S,
    sink: K,
    config: ReallocationConfig,
}

impl<S, K> ReallocationRun<S, K>
where
    S: OrderSource,
    K: OrderSink,
{
    pub fn new(source: S, sink: K, config: ReallocationConfig) -> Self {
        Self { source, sink, config }
    }

    pub fn config(&self) -> &ReallocationConfig {
        &self.config
    }

    /// Run to completion. Errors are logged once here and recorded in the
    /// report; they never escape.
    pub fn execute(&self, request: &RunRequest) -> RunReport {
        let mut report = RunReport::new(request);
        if let Err(err) = self.run(request, &mut report) {
            tracing::error!(
                error = %err,
                orders_finalized = report.orders.len(),
                "reallocation run aborted"
            );
            report.outcome = RunOutcome::Aborted { error: err.to_string() };
        }
        report.finished_at = Some(Utc::now());
        report
    }

    /// Like [`execute`](Self::execute), but hands the error to the caller.
    pub fn try_execute(&self, request: &RunRequest) -> Result<RunReport, RunError> {
        let mut report = RunReport::new(request);
        self.run(request, &mut report)?;
        report.finished_at = Some(Utc::now());
        Ok(report)
    }

    fn run(&self, request: &RunRequest, report: &mut RunReport) -> Result<(), RunError> {
        tracing::info!(
            orders = request.order_ids().len(),
            primary = %request.primary_location_id(),
            strategy = ?self.config.strategy,
            mode = ?self.config.mode,
            "starting reallocation run"
        );

        if request.order_ids().is_empty() {
            tracing::info!("no orders requested, nothing to do");
            report.outcome = RunOutcome::ShortCircuited {
                reason: ShortCircuit::NoOrderIds,
            };
            return Ok(());
        }

        // 1) Locations
        let locations = self.source.fetch_locations()?;
        let ctx = RunContext::resolve(locations, request, self.config);
        report.alternate_location_ids = ctx.alternate_location_ids().to_vec();
        if ctx.alternate_location_ids().is_empty() {
            tracing::info!("no valid alternate locations, skipping run");
            report.outcome = RunOutcome::ShortCircuited {
                reason: ShortCircuit::NoAlternateLocations,
            };
            return Ok(());
        }

        // 2) Orders
        let orders = self.source.fetch_orders_by_id(request.order_ids())?;
        if orders.is_empty() {
            tracing::info!("none of the requested orders were found");
            report.outcome = RunOutcome::ShortCircuited {
                reason: ShortCircuit::NoOrdersFound,
            };
            return Ok(());
        }

        let eligible: Vec<&Order> = orders.iter().filter(|o| ctx.is_eligible(o)).collect();
        if eligible.is_empty() {
            tracing::info!(fetched = orders.len(), "no orders at eligible locations");
            report.outcome = RunOutcome::ShortCircuited {
                reason: ShortCircuit::NoEligibleOrders,
            };
            return Ok(());
        }

        // 3) Stock levels
        let item_ids = distinct_items(&eligible);
        let snapshots = self.source.fetch_stock_levels_batch(&item_ids)?;
        if snapshots.is_empty() {
            tracing::info!(items = item_ids.len(), "no stock levels found, skipping run");
            report.outcome = RunOutcome::ShortCircuited {
                reason: ShortCircuit::NoStockLevels,
            };
            return Ok(());
        }

        let mut ledger = StockLedger::seed(&snapshots, &item_ids, &ctx.ledger_locations(eligible.iter().copied()));
        tracing::debug!(positions = ledger.len(), "ledger seeded");

        // 4) Plan and apply, order by order
        let planner = OrderReallocationPlanner::new(&ctx);
        let executor = PlanExecutor::new(&self.sink, &ctx);
        let mut aggregator = AllocationAggregator::new();

        for order in eligible {
            let plan = planner.plan(&mut ledger, &mut aggregator, order)?;
            let applied = executor.apply(&plan)?;
            report.orders.push(OrderReport::new(&plan, applied));
        }

        report.outcome = RunOutcome::Completed;
        tracing::info!(
            orders = report.orders.len(),
            allocated = report.total_allocated(),
            created_orders = report.created_orders().count(),
            "reallocation run completed"
        );
        Ok(())
    }
}

/// Item ids across `orders`, in first-seen order.
fn distinct_items(orders: &[&Order]) -> Vec<ItemId> {
    let mut item_ids = Vec::new();
    for order in orders {
        for item in &order.items {
            if !item_ids.contains(&item.item_id) {
                item_ids.push(item.item_id);
            }
        }
    }
    item_ids
}
