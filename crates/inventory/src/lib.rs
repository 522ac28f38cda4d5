//! Stock ledger for allocation runs.
//!
//! This crate holds the per (item, location) running stock counters that the
//! allocator draws from, implemented purely as in-memory bookkeeping (no IO,
//! no persistence between runs).

pub mod backorder;
pub mod ledger;
pub mod position;

pub use backorder::BackorderAvailabilityDetail;
pub use ledger::{LocationStockLevel, StockLedger, StockLevelSnapshot};
pub use position::StockPosition;
