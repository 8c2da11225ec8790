//! Activity log storage and the recorder that turns accepted events into
//! audit entries.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};

use stockroom_core::{ActivityId, ItemId};
use stockroom_inventory::{ActivityRecord, InventoryEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// An entry with this id already exists; the log never overwrites.
    #[error("duplicate activity id: {0}")]
    Duplicate(ActivityId),

    #[error("activity log unavailable: {0}")]
    Unavailable(String),
}

/// Append-only log of activity records.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, record: ActivityRecord) -> Result<(), AuditError>;

    /// All records for one item, oldest first.
    async fn for_item(&self, item_id: ItemId) -> Result<Vec<ActivityRecord>, AuditError>;

    /// Most recent records across all items, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<ActivityRecord>, AuditError>;
}

#[async_trait]
impl<L> ActivityLog for Arc<L>
where
    L: ActivityLog + ?Sized,
{
    async fn append(&self, record: ActivityRecord) -> Result<(), AuditError> {
        (**self).append(record).await
    }

    async fn for_item(&self, item_id: ItemId) -> Result<Vec<ActivityRecord>, AuditError> {
        (**self).for_item(item_id).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ActivityRecord>, AuditError> {
        (**self).recent(limit).await
    }
}

/// In-memory activity log for tests/dev. Keeps records in append order.
#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    records: RwLock<Vec<ActivityRecord>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> AuditError {
    AuditError::Unavailable("activity log lock poisoned".to_string())
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn append(&self, record: ActivityRecord) -> Result<(), AuditError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(AuditError::Duplicate(record.id()));
        }
        records.push(record);
        Ok(())
    }

    async fn for_item(&self, item_id: ItemId) -> Result<Vec<ActivityRecord>, AuditError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut out: Vec<_> = records
            .iter()
            .filter(|r| r.inventory_id() == item_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at());
        Ok(out)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ActivityRecord>, AuditError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut out: Vec<_> = records.iter().cloned().collect();
        // Stable sort on the reversed log keeps later appends first among ties.
        out.reverse();
        out.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        out.truncate(limit);
        Ok(out)
    }
}

/// Writes one audit entry per accepted event.
///
/// Failures are logged and returned but never undo the stock write that
/// produced the event; callers treat them as non-fatal.
#[derive(Debug, Clone)]
pub struct ActivityRecorder<L> {
    log: L,
}

impl<L> ActivityRecorder<L>
where
    L: ActivityLog,
{
    pub fn new(log: L) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub async fn record(&self, event: &InventoryEvent) -> Result<ActivityRecord, AuditError> {
        let record = ActivityRecord::from_event(ActivityId::new(), event);

        match self.log.append(record.clone()).await {
            Ok(()) => {
                debug!(
                    item_id = %record.inventory_id(),
                    activity_id = %record.id(),
                    action = ?record.action(),
                    "activity recorded"
                );
                Ok(record)
            }
            Err(err) => {
                error!(
                    item_id = %record.inventory_id(),
                    error = %err,
                    "failed to write activity log; stock change is kept"
                );
                Err(err)
            }
        }
    }
}
