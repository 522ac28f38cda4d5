//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures raised by the allocation core
/// (bad input, ledger invariants, snapshot gaps). Remote collaborator failures
/// belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Caller input failed validation (empty order list, bad location, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A ledger `commit`/`release` was asked to move more than the position holds.
    ///
    /// The allocator only ever requests amounts it has just computed as allowed,
    /// so this signals a contract breach rather than a business condition.
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    /// An item/location pair was referenced that the ledger was never seeded with.
    #[error("inconsistent snapshot: {0}")]
    InconsistentSnapshot(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_stock(msg: impl Into<String>) -> Self {
        Self::InsufficientStock(msg.into())
    }

    pub fn inconsistent_snapshot(msg: impl Into<String>) -> Self {
        Self::InconsistentSnapshot(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
