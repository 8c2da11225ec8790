//! Infrastructure layer: storage, audit log, realtime feed, configuration,
//! and the async write path that ties them together.

pub mod activity;
pub mod config;
pub mod errors;
pub mod realtime;
pub mod service;
pub mod store;
pub mod workflow;


pub use activity::{ActivityLog, ActivityRecorder, AuditError, InMemoryActivityLog};
pub use config::{ConcurrencyMode, StockroomConfig};
pub use errors::{
    CollectingErrorReporter, ErrorReporter, PersistenceError, STOCK_UPDATE_FAILED,
    TracingErrorReporter,
};
pub use realtime::{RealtimeBridge, RealtimeListener, WorkerHandle};
pub use service::{LedgerService, StockPersistence};
pub use store::{InMemoryItemStore, ItemStore};
pub use workflow::{AdjustmentWorkflow, ConfirmOutcome};
