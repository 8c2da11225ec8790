//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failures of the stock ledger.
///
/// Storage and network failures belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Rejected input, such as an empty quantity or an unknown location.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Stored state broke a ledger rule, such as locations no longer summing
    /// to the stock.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The item does not exist (or was deleted).
    #[error("not found")]
    NotFound,

    /// Stale revision, or an item that already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// A removal asked for more than the selected scope holds.
    pub fn insufficient_stock(requested: u64, available: u64) -> Self {
        Self::validation(format!(
            "insufficient stock: requested {requested}, available {available}"
        ))
    }

    /// Location quantities and the aggregate stock disagree.
    pub fn unreconciled(location_total: u64, stock: u64) -> Self {
        Self::invariant(format!(
            "location quantities sum to {location_total}, but stock is {stock}"
        ))
    }
}
