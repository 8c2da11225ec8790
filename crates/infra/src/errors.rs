//! Persistence errors and the reporting seam for user-visible failures.

use std::sync::Mutex;

use thiserror::Error;
use tracing::error;

use stockroom_core::DomainError;

/// Message key shown when an adjustment could not be saved.
pub const STOCK_UPDATE_FAILED: &str = "errors.stock_update_failed";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("item not found")]
    NotFound,

    /// Stale revision or duplicate create.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The ledger rejected the write.
    #[error("rejected: {0}")]
    Domain(DomainError),

    /// The backing store failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<DomainError> for PersistenceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => PersistenceError::NotFound,
            DomainError::Conflict(msg) => PersistenceError::Conflict(msg),
            other => PersistenceError::Domain(other),
        }
    }
}

/// Surfaces failures to the user. Implementations decide how (toast, log, ...).
pub trait ErrorReporter: Send + Sync {
    fn handle_error(&self, error: &PersistenceError, message_key: Option<&'static str>);
}

/// Reports through `tracing` only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn handle_error(&self, err: &PersistenceError, message_key: Option<&'static str>) {
        error!(error = %err, message_key = message_key.unwrap_or(""), "operation failed");
    }
}

/// Keeps every report; used by tests and headless clients that poll for errors.
#[derive(Debug, Default)]
pub struct CollectingErrorReporter {
    reports: Mutex<Vec<(PersistenceError, Option<&'static str>)>>,
}

impl CollectingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(PersistenceError, Option<&'static str>)> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl ErrorReporter for CollectingErrorReporter {
    fn handle_error(&self, err: &PersistenceError, message_key: Option<&'static str>) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push((err.clone(), message_key));
        }
    }
}
