//! Run configuration and validated run input.

use serde::{Deserialize, Serialize};

use stockroute_allocation::AllocationPolicy;
use stockroute_core::{DomainError, DomainResult, LocationId, OrderId};

/// Upper bound on alternate locations accepted for one run.
pub const MAX_ALTERNATE_LOCATIONS: usize = 5;

/// How allocations are turned into order mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReallocationStrategy {
    /// Walk every bin-rack across `[primary, alternates..]` and rewrite the
    /// order's bin-racks (optionally splitting other locations into new orders).
    #[default]
    RewriteBinRacks,
    /// Move only the primary's shortfall into new orders at the alternates.
    SplitOrders,
}

/// What `RewriteBinRacks` does with bin-racks that land away from the
/// fulfilment location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReallocationMode {
    /// Keep them on the original order (multi-location bin-racks).
    InPlaceOnly,
    /// Move each other location's share into a new sibling order.
    #[default]
    InPlaceWithSplitOrders,
}

/// Behavioral configuration of one reallocation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReallocationConfig {
    pub strategy: ReallocationStrategy,
    pub mode: ReallocationMode,
    pub policy: AllocationPolicy,
    /// Give newly created orders an apportioned postage cost. When off, new
    /// orders carry the postal service only and are priced downstream.
    pub recompute_shipping_cost_on_split: bool,
}

impl ReallocationConfig {
    /// Bin-rack rewrite with sibling orders and apportioned shipping.
    pub fn rewrite_bin_racks() -> Self {
        Self {
            strategy: ReallocationStrategy::RewriteBinRacks,
            mode: ReallocationMode::InPlaceWithSplitOrders,
            policy: AllocationPolicy::self_included(),
            recompute_shipping_cost_on_split: true,
        }
    }

    /// Shortfall split into new orders; new orders are not priced.
    pub fn split_orders() -> Self {
        Self {
            strategy: ReallocationStrategy::SplitOrders,
            mode: ReallocationMode::InPlaceWithSplitOrders,
            policy: AllocationPolicy {
                include_source_in_targets: false,
                skip_zero_available_targets: true,
                backorder_to_source_bin_rack: false,
            },
            recompute_shipping_cost_on_split: false,
        }
    }

    pub fn with_mode(mut self, mode: ReallocationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_policy(mut self, policy: AllocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_recompute_shipping_cost_on_split(mut self, recompute: bool) -> Self {
        self.recompute_shipping_cost_on_split = recompute;
        self
    }
}

impl Default for ReallocationConfig {
    fn default() -> Self {
        Self::rewrite_bin_racks()
    }
}

/// Input of one run, as supplied by the entry point.
///
/// Nil identifiers mean "not supplied" and are dropped. An empty order list or
/// an empty alternate list is accepted here; the run short-circuits on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    order_ids: Vec<OrderId>,
    primary_location_id: LocationId,
    alternate_location_ids: Vec<LocationId>,
}

impl RunRequest {
    pub fn new(
        order_ids: impl IntoIterator<Item = OrderId>,
        primary_location_id: LocationId,
        alternate_location_ids: impl IntoIterator<Item = LocationId>,
    ) -> DomainResult<Self> {
        if primary_location_id.is_nil() {
            return Err(DomainError::validation("primary location must be supplied"));
        }

        let mut orders: Vec<OrderId> = Vec::new();
        for id in order_ids {
            if !id.is_nil() && !orders.contains(&id) {
                orders.push(id);
            }
        }

        let alternates: Vec<LocationId> = alternate_location_ids
            .into_iter()
            .filter(|id| !id.is_nil())
            .collect();
        if alternates.len() > MAX_ALTERNATE_LOCATIONS {
            return Err(DomainError::validation(format!(
                "at most {MAX_ALTERNATE_LOCATIONS} alternate locations are supported (got {})",
                alternates.len()
            )));
        }

        Ok(Self {
            order_ids: orders,
            primary_location_id,
            alternate_location_ids: alternates,
        })
    }

    pub fn order_ids(&self) -> &[OrderId] {
        &self.order_ids
    }

    pub fn primary_location_id(&self) -> LocationId {
        self.primary_location_id
    }

    pub fn alternate_location_ids(&self) -> &[LocationId] {
        &self.alternate_location_ids
    }
}
