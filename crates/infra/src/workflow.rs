//! Drives an adjustment session through save and completion.

use tracing::{debug, warn};

use stockroom_inventory::{AdjustmentSession, InventoryItem, LocationRegistry};

use crate::errors::{ErrorReporter, PersistenceError, STOCK_UPDATE_FAILED};
use crate::service::StockPersistence;

/// Result of pressing "confirm".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The session was not in a confirmable state; nothing was sent.
    NotReady,
    /// Saved; the session is closed.
    Saved,
    /// The save failed and was reported; the session stays open for retry.
    Failed(PersistenceError),
}

#[derive(Debug)]
pub struct AdjustmentWorkflow<P, R> {
    persistence: P,
    reporter: R,
    registry: LocationRegistry,
}

impl<P, R> AdjustmentWorkflow<P, R>
where
    P: StockPersistence,
    R: ErrorReporter,
{
    pub fn new(persistence: P, reporter: R) -> Self {
        Self {
            persistence,
            reporter,
            registry: LocationRegistry::default(),
        }
    }

    pub fn with_registry(mut self, registry: LocationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub async fn confirm(&self, session: &mut AdjustmentSession, item: &InventoryItem) -> ConfirmOutcome {
        if session.is_loading() {
            return ConfirmOutcome::NotReady;
        }
        let request = match session.confirm(item, &self.registry) {
            Ok(request) => request,
            Err(err) => {
                debug!(item_id = %item.id_typed(), error = %err, "adjustment not confirmable");
                return ConfirmOutcome::NotReady;
            }
        };

        let result = self.persistence.save_adjustment(request).await;
        session.complete(&result);

        match result {
            Ok(()) => ConfirmOutcome::Saved,
            Err(err) => {
                warn!(item_id = %item.id_typed(), error = %err, "adjustment save failed");
                self.reporter.handle_error(&err, Some(STOCK_UPDATE_FAILED));
                ConfirmOutcome::Failed(err)
            }
        }
    }
}
