//! Item snapshot storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use stockroom_core::{AggregateRoot, ExpectedVersion, ItemId};
use stockroom_inventory::InventoryItem;

use crate::errors::PersistenceError;

/// Current-state storage for inventory items, keyed by id.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get(&self, id: ItemId) -> Result<Option<InventoryItem>, PersistenceError>;

    /// Insert or replace the snapshot.
    ///
    /// `expected` is checked against the revision currently stored (0 when the
    /// item is absent) under the same lock as the write.
    async fn put(&self, item: InventoryItem, expected: ExpectedVersion) -> Result<(), PersistenceError>;

    async fn delete(&self, id: ItemId) -> Result<(), PersistenceError>;

    async fn list(&self) -> Result<Vec<InventoryItem>, PersistenceError>;
}

#[async_trait]
impl<S> ItemStore for Arc<S>
where
    S: ItemStore + ?Sized,
{
    async fn get(&self, id: ItemId) -> Result<Option<InventoryItem>, PersistenceError> {
        (**self).get(id).await
    }

    async fn put(&self, item: InventoryItem, expected: ExpectedVersion) -> Result<(), PersistenceError> {
        (**self).put(item, expected).await
    }

    async fn delete(&self, id: ItemId) -> Result<(), PersistenceError> {
        (**self).delete(id).await
    }

    async fn list(&self) -> Result<Vec<InventoryItem>, PersistenceError> {
        (**self).list().await
    }
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    inner: RwLock<HashMap<ItemId, InventoryItem>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing snapshots.
    pub fn with_items(items: impl IntoIterator<Item = InventoryItem>) -> Self {
        let map = items.into_iter().map(|i| (i.id_typed(), i)).collect();
        Self {
            inner: RwLock::new(map),
        }
    }
}

fn poisoned() -> PersistenceError {
    PersistenceError::Storage("item store lock poisoned".to_string())
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn get(&self, id: ItemId) -> Result<Option<InventoryItem>, PersistenceError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn put(&self, item: InventoryItem, expected: ExpectedVersion) -> Result<(), PersistenceError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let current = map.get(&item.id_typed()).map(|i| i.version()).unwrap_or(0);
        expected.check(current)?;
        map.insert(item.id_typed(), item);
        Ok(())
    }

    async fn delete(&self, id: ItemId) -> Result<(), PersistenceError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(&id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<InventoryItem>, PersistenceError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut items: Vec<_> = map.values().cloned().collect();
        items.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(items)
    }
}
