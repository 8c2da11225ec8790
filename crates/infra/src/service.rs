//! Ledger service: the write path for inventory items.
//!
//! Every operation runs the same pipeline:
//!
//! ```text
//! load item -> handle command (pure) -> write snapshot
//!           -> append activity record -> publish change
//! ```
//!
//! The snapshot write is the commit point. Activity and realtime failures after
//! it are logged and do not undo the stock change.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument, warn};

use stockroom_core::{AggregateRoot, ExpectedVersion, ItemId, UserId};
use stockroom_events::{ChangeEvent, EventBus, execute};
use stockroom_inventory::{
    AdjustStock, CreateItem, DeleteItem, EditStock, HistoryEntry, InventoryCommand, InventoryEvent,
    InventoryItem, LocationRegistry, SaveAdjustment, StockLocationEntry, narrate_timeline,
};

use crate::activity::{ActivityLog, ActivityRecorder};
use crate::config::{ConcurrencyMode, StockroomConfig};
use crate::errors::PersistenceError;
use crate::realtime::RealtimeBridge;
use crate::store::ItemStore;

/// Persists a confirmed adjustment as one logical operation.
#[async_trait]
pub trait StockPersistence: Send + Sync {
    async fn save_adjustment(&self, request: SaveAdjustment) -> Result<(), PersistenceError>;
}

#[async_trait]
impl<P> StockPersistence for Arc<P>
where
    P: StockPersistence + ?Sized,
{
    async fn save_adjustment(&self, request: SaveAdjustment) -> Result<(), PersistenceError> {
        (**self).save_adjustment(request).await
    }
}

/// Write path for one signed-in user (or the system when `actor` is `None`).
#[derive(Debug)]
pub struct LedgerService<S, L, B> {
    store: S,
    recorder: ActivityRecorder<L>,
    realtime: RealtimeBridge<B>,
    registry: LocationRegistry,
    config: StockroomConfig,
    actor: Option<UserId>,
}

impl<S, L, B> LedgerService<S, L, B>
where
    S: ItemStore,
    L: ActivityLog,
    B: EventBus<ChangeEvent>,
{
    pub fn new(store: S, log: L, bus: B, config: StockroomConfig) -> Self {
        Self {
            store,
            recorder: ActivityRecorder::new(log),
            realtime: RealtimeBridge::new(config.channel.clone(), bus),
            registry: LocationRegistry::default(),
            config,
            actor: None,
        }
    }

    pub fn with_registry(mut self, registry: LocationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn acting_as(mut self, user: UserId) -> Self {
        self.actor = Some(user);
        self
    }

    pub fn config(&self) -> &StockroomConfig {
        &self.config
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn realtime(&self) -> &RealtimeBridge<B> {
        &self.realtime
    }

    pub async fn item(&self, id: ItemId) -> Result<InventoryItem, PersistenceError> {
        self.store.get(id).await?.ok_or(PersistenceError::NotFound)
    }

    pub async fn items(&self) -> Result<Vec<InventoryItem>, PersistenceError> {
        self.store.list().await
    }

    /// Narrated history of one item, oldest first.
    pub async fn history(&self, id: ItemId) -> Result<Vec<HistoryEntry>, PersistenceError> {
        let records = self
            .recorder
            .log()
            .for_item(id)
            .await
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        Ok(narrate_timeline(&records))
    }

    #[instrument(skip(self, locations))]
    pub async fn create_item(
        &self,
        name: &str,
        stock: u64,
        locations: Vec<StockLocationEntry>,
    ) -> Result<InventoryItem, PersistenceError> {
        let id = ItemId::new();
        let mut item = InventoryItem::empty(id);
        let cmd = InventoryCommand::CreateItem(CreateItem {
            item_id: id,
            user_id: self.actor,
            name: name.to_string(),
            stock,
            locations: self.registry.denormalize(locations),
            occurred_at: Utc::now(),
        });

        let events = execute(&mut item, &cmd)?;
        // Never overwrite an existing row, whatever the concurrency mode.
        self.store.put(item.clone(), ExpectedVersion::Exact(0)).await?;

        info!(item_id = %id, stock = item.stock(), "item created");
        self.record(&events).await;
        self.realtime.publish_item_inserted(&item, self.actor);
        Ok(item)
    }

    /// Direct edit: replace the total and the distribution in one write.
    pub async fn edit_item(
        &self,
        id: ItemId,
        stock: u64,
        locations: Vec<StockLocationEntry>,
        expected_revision: Option<u64>,
    ) -> Result<InventoryItem, PersistenceError> {
        let mut item = self.item(id).await?;
        let expected = self.expected_version(expected_revision, item.version());
        let cmd = InventoryCommand::EditStock(EditStock {
            item_id: id,
            user_id: self.actor,
            stock,
            locations: self.registry.denormalize(locations),
            occurred_at: Utc::now(),
        });

        let events = execute(&mut item, &cmd)?;
        self.store.put(item.clone(), expected).await?;

        info!(item_id = %id, action_type = "adjust", new_stock = item.stock(), "stock edited");
        self.record(&events).await;
        self.realtime.publish_item_updated(&item, self.actor);
        Ok(item)
    }

    pub async fn delete_item(&self, id: ItemId) -> Result<(), PersistenceError> {
        let mut item = self.item(id).await?;
        let cmd = InventoryCommand::DeleteItem(DeleteItem {
            item_id: id,
            user_id: self.actor,
            occurred_at: Utc::now(),
        });

        let events = execute(&mut item, &cmd)?;
        self.store.delete(id).await?;

        info!(item_id = %id, "item deleted");
        self.record(&events).await;
        self.realtime.publish_item_deleted(&item, self.actor);
        Ok(())
    }

    /// Revision the store must still hold for the write to go through.
    fn expected_version(&self, requested: Option<u64>, loaded: u64) -> ExpectedVersion {
        match self.config.concurrency {
            ConcurrencyMode::LastWriteWins => ExpectedVersion::Any,
            ConcurrencyMode::RevisionCheck => ExpectedVersion::Exact(requested.unwrap_or(loaded)),
        }
    }

    async fn record(&self, events: &[InventoryEvent]) {
        for event in events {
            // Failure is already logged by the recorder.
            if let Ok(record) = self.recorder.record(event).await {
                self.realtime.publish_activity_inserted(&record);
            }
        }
    }
}

#[async_trait]
impl<S, L, B> StockPersistence for LedgerService<S, L, B>
where
    S: ItemStore,
    L: ActivityLog,
    B: EventBus<ChangeEvent>,
{
    #[instrument(
        skip(self, request),
        fields(item_id = %request.item_id, action_type = request.action.as_str())
    )]
    async fn save_adjustment(&self, request: SaveAdjustment) -> Result<(), PersistenceError> {
        let mut item = self.item(request.item_id).await?;
        let expected = self.expected_version(request.expected_revision, item.version());
        if let Some(seen) = request.expected_revision.filter(|r| *r != item.version()) {
            warn!(seen, loaded = item.version(), "adjustment based on a stale revision");
        }

        let requested_total = request.new_stock;
        let cmd = InventoryCommand::AdjustStock(AdjustStock {
            request,
            user_id: self.actor,
            guard: self.config.removal_guard,
            occurred_at: Utc::now(),
        });

        let events = execute(&mut item, &cmd)?;
        self.store.put(item.clone(), expected).await?;

        info!(
            new_stock = item.stock(),
            requested_total,
            revision = item.version(),
            "stock adjusted"
        );
        self.record(&events).await;
        self.realtime.publish_item_updated(&item, self.actor);
        Ok(())
    }
}
