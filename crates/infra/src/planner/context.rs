use stockroute_core::LocationId;
use stockroute_sales::Order;

use crate::config::{ReallocationConfig, ReallocationStrategy, RunRequest};
use crate::gateway::LocationDirectory;

/// Per-run settings shared by planning and execution.
///
/// Built once after the location fetch; alternates are already validated
/// against the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    locations: LocationDirectory,
    primary_location_id: LocationId,
    alternate_location_ids: Vec<LocationId>,
    config: ReallocationConfig,
}

impl RunContext {
    pub fn new(
        locations: LocationDirectory,
        primary_location_id: LocationId,
        alternate_location_ids: Vec<LocationId>,
        config: ReallocationConfig,
    ) -> Self {
        Self {
            locations,
            primary_location_id,
            alternate_location_ids,
            config,
        }
    }

    /// Validate the request's locations against `locations`.
    ///
    /// Unknown alternates, repeats and the primary itself are dropped with a
    /// warning.
    pub fn resolve(locations: LocationDirectory, request: &RunRequest, config: ReallocationConfig) -> Self {
        let primary = request.primary_location_id();
        if !locations.contains_key(&primary) {
            tracing::warn!(location = %primary, "primary location is not known to the order system");
        }

        let mut alternates: Vec<LocationId> = Vec::new();
        for id in request.alternate_location_ids() {
            if !locations.contains_key(id) {
                tracing::warn!(location = %id, "unknown alternate location, dropping");
                continue;
            }
            if *id == primary || alternates.contains(id) {
                tracing::warn!(location = %id, "duplicate alternate location, dropping");
                continue;
            }
            alternates.push(*id);
        }

        Self::new(locations, primary, alternates, config)
    }

    pub fn config(&self) -> &ReallocationConfig {
        &self.config
    }

    pub fn primary_location_id(&self) -> LocationId {
        self.primary_location_id
    }

    pub fn alternate_location_ids(&self) -> &[LocationId] {
        &self.alternate_location_ids
    }

    /// `[primary, alternates..]`.
    pub fn candidates(&self) -> Vec<LocationId> {
        let mut candidates = Vec::with_capacity(self.alternate_location_ids.len() + 1);
        candidates.push(self.primary_location_id);
        candidates.extend_from_slice(&self.alternate_location_ids);
        candidates
    }

    /// Whether `order` is in scope for the configured strategy.
    pub fn is_eligible(&self, order: &Order) -> bool {
        match self.config.strategy {
            ReallocationStrategy::RewriteBinRacks => self.candidates().contains(&order.fulfilment_location_id),
            ReallocationStrategy::SplitOrders => order.fulfilment_location_id == self.primary_location_id,
        }
    }

    /// Display name for `location_id`, falling back to the id itself.
    pub fn location_name(&self, location_id: LocationId) -> String {
        self.locations
            .get(&location_id)
            .cloned()
            .unwrap_or_else(|| location_id.to_string())
    }

    /// Every location the ledger must hold a position for when planning
    /// `orders`: the candidates plus each fulfilment and bin-rack location.
    pub fn ledger_locations<'a>(&self, orders: impl IntoIterator<Item = &'a Order>) -> Vec<LocationId> {
        let mut locations = self.candidates();
        let mut push = |id: LocationId| {
            if !locations.contains(&id) {
                locations.push(id);
            }
        };
        for order in orders {
            push(order.fulfilment_location_id);
            for item in &order.items {
                for bin_rack in &item.bin_racks {
                    push(bin_rack.location_id);
                }
            }
        }
        locations
    }
}
