//! Waterfall allocation of short order lines across ranked locations.
//!
//! Pure domain logic: the allocator mutates a [`StockLedger`] supplied by the
//! caller and reports what it moved. No IO.
//!
//! [`StockLedger`]: stockroute_inventory::StockLedger

pub mod aggregate;
pub mod demand;
pub mod policy;
pub mod waterfall;

pub use aggregate::{AllocationAggregate, AllocationAggregator};
pub use demand::DemandLine;
pub use policy::AllocationPolicy;
pub use waterfall::{
    AllocationRecord, BinRackAllocations, BinRackKey, WaterfallAllocator, WaterfallOutcome,
};
