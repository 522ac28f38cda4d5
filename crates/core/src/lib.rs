//! `stockroute-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, and the value-type keys shared by the
//! stock ledger and the allocation aggregate.

pub mod entity;
pub mod error;
pub mod id;
pub mod key;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ItemId, LocationId, OrderId, PostalServiceId, RowId};
pub use key::ItemLocationKey;
pub use value_object::ValueObject;
