//! Boundary to the external order system.
//!
//! The run reads orders, locations and stock levels through [`OrderSource`]
//! and pushes every mutation through [`OrderSink`]. Both are synchronous and
//! make no transport assumptions.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{CallKind, GatewayCall, GatewaySnapshot, InMemoryGateway, OrderNote};
pub use r#trait::{GatewayError, LocationDirectory, NewOrderLine, OrderSink, OrderSource};
