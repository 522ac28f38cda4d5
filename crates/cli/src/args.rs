use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use stockroute_allocation::AllocationPolicy;
use stockroute_core::{DomainResult, LocationId, OrderId};
use stockroute_infra::{ReallocationConfig, ReallocationMode, RunRequest};
use stockroute_observability::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "stockroute", version)]
#[command(about = "Reallocate short order lines across alternate warehouse locations")]
pub struct Cli {
    /// JSON snapshot with locations, orders and stock levels
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Order to process (repeatable)
    #[arg(long = "order", value_name = "ORDER_ID")]
    pub orders: Vec<OrderId>,

    /// Primary fulfilment location
    #[arg(long)]
    pub primary: LocationId,

    /// Alternate location, in priority order (repeatable, at most 5)
    #[arg(long = "alternate", value_name = "LOCATION_ID")]
    pub alternates: Vec<LocationId>,

    /// JSON file with a full run configuration; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Give split orders an apportioned postage cost
    #[arg(long)]
    pub recompute_split_shipping: bool,

    /// Log output format (json or pretty)
    #[arg(long, env = "STOCKROUTE_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    RewriteBinRacks,
    SplitOrders,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    InPlaceOnly,
    InPlaceWithSplitOrders,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    SelfIncluded,
    SkipExhausted,
}

impl From<ModeArg> for ReallocationMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::InPlaceOnly => ReallocationMode::InPlaceOnly,
            ModeArg::InPlaceWithSplitOrders => ReallocationMode::InPlaceWithSplitOrders,
        }
    }
}

impl From<PolicyArg> for AllocationPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::SelfIncluded => AllocationPolicy::self_included(),
            PolicyArg::SkipExhausted => AllocationPolicy::skip_exhausted(),
        }
    }
}

impl Cli {
    /// Apply the command-line overrides on top of `base`.
    ///
    /// `--strategy` swaps in that strategy's preset before the other flags apply.
    pub fn reallocation_config(&self, base: ReallocationConfig) -> ReallocationConfig {
        let mut config = match self.strategy {
            Some(StrategyArg::RewriteBinRacks) => ReallocationConfig::rewrite_bin_racks(),
            Some(StrategyArg::SplitOrders) => ReallocationConfig::split_orders(),
            None => base,
        };
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(policy) = self.policy {
            config.policy = policy.into();
        }
        if self.recompute_split_shipping {
            config.recompute_shipping_cost_on_split = true;
        }
        config
    }

    pub fn run_request(&self) -> DomainResult<RunRequest> {
        RunRequest::new(
            self.orders.iter().copied(),
            self.primary,
            self.alternates.iter().copied(),
        )
    }
}
