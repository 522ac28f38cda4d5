//! Infrastructure layer: order-system boundary, run configuration and the
//! reallocation pipeline that ties the allocation core to them.

pub mod config;
pub mod executor;
pub mod gateway;
pub mod planner;
pub mod run;

mod integration_tests;

pub use config::{ReallocationConfig, ReallocationMode, ReallocationStrategy, RunRequest, MAX_ALTERNATE_LOCATIONS};
pub use executor::{AppliedPlan, CreatedOrder, PlanExecutor};
pub use gateway::{GatewayError, GatewaySnapshot, InMemoryGateway, OrderSink, OrderSource};
pub use planner::{OrderPlan, OrderReallocationPlanner, PlanState, RunContext};
pub use run::{ReallocationRun, RunError, RunOutcome, RunReport, ShortCircuit};
