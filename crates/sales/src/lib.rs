//! Order snapshot model.
//!
//! Orders are owned by the remote order system; this crate only describes the
//! shape the allocation core reads (and the line fields it rewrites).

pub mod order;

pub use order::{
    Address, BinRack, CustomerInfo, GeneralInfo, LinePricing, Order, OrderItem, OrderStatus,
    ShippingInfo,
};
