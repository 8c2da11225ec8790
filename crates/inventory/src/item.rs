use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Aggregate, AggregateRoot, DomainError, ItemId, UserId};
use stockroom_events::Event;

use crate::adjustment::{Provenance, SaveAdjustment};
use crate::ledger::{self, AdjustAction, RemovalGuard};
use crate::location::StockLocationEntry;

/// Aggregate root: InventoryItem.
///
/// Holds the authoritative aggregate stock and its optional per-location
/// distribution. The item is stored as a state snapshot; every accepted command
/// also yields events that the infra layer turns into activity records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    id: ItemId,
    name: String,
    stock: u64,
    stock_locations: Vec<StockLocationEntry>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl InventoryItem {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ItemId) -> Self {
        Self {
            id,
            name: String::new(),
            stock: 0,
            stock_locations: Vec::new(),
            version: 0,
            created: false,
            deleted: false,
        }
    }

    /// Rebuild an existing item from a stored snapshot.
    pub fn restore(
        id: ItemId,
        name: impl Into<String>,
        stock: u64,
        stock_locations: Vec<StockLocationEntry>,
        version: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            stock,
            stock_locations,
            version,
            created: true,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stock(&self) -> u64 {
        self.stock
    }

    pub fn stock_locations(&self) -> &[StockLocationEntry] {
        &self.stock_locations
    }

    /// True when stock is additionally broken down into named locations.
    pub fn is_location_tracked(&self) -> bool {
        !self.stock_locations.is_empty()
    }

    pub fn find_location(&self, name: &str) -> Option<&StockLocationEntry> {
        self.stock_locations.iter().find(|e| e.location_name == name)
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Whether the reconciliation invariant currently holds.
    pub fn is_reconciled(&self) -> bool {
        ledger::check_reconciled(self.stock, &self.stock_locations).is_ok()
    }
}

impl AggregateRoot for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub item_id: ItemId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub stock: u64,
    pub locations: Vec<StockLocationEntry>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustStock (one confirmed add/remove from the adjustment workflow).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub request: SaveAdjustment,
    pub user_id: Option<UserId>,
    pub guard: RemovalGuard,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EditStock (direct edit form; replaces stock and distribution).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditStock {
    pub item_id: ItemId,
    pub user_id: Option<UserId>,
    pub stock: u64,
    pub locations: Vec<StockLocationEntry>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteItem {
    pub item_id: ItemId,
    pub user_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    CreateItem(CreateItem),
    AdjustStock(AdjustStock),
    EditStock(EditStock),
    DeleteItem(DeleteItem),
}

/// Event: ItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub item_id: ItemId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub stock: u64,
    pub locations: Vec<StockLocationEntry>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAdjusted.
///
/// Carries the resulting distribution so `apply` stays a plain assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub item_id: ItemId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub action: AdjustAction,
    pub quantity: u32,
    pub old_stock: u64,
    pub new_stock: u64,
    pub location: Option<String>,
    pub parent_location: Option<String>,
    pub provenance: Provenance,
    pub locations: Vec<StockLocationEntry>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockEdited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEdited {
    pub item_id: ItemId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub old_stock: u64,
    pub new_stock: u64,
    pub locations: Vec<StockLocationEntry>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDeleted {
    pub item_id: ItemId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub stock: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemCreated(ItemCreated),
    StockAdjusted(StockAdjusted),
    StockEdited(StockEdited),
    ItemDeleted(ItemDeleted),
}

impl InventoryEvent {
    pub fn item_id(&self) -> ItemId {
        match self {
            InventoryEvent::ItemCreated(e) => e.item_id,
            InventoryEvent::StockAdjusted(e) => e.item_id,
            InventoryEvent::StockEdited(e) => e.item_id,
            InventoryEvent::ItemDeleted(e) => e.item_id,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            InventoryEvent::ItemCreated(e) => e.user_id,
            InventoryEvent::StockAdjusted(e) => e.user_id,
            InventoryEvent::StockEdited(e) => e.user_id,
            InventoryEvent::ItemDeleted(e) => e.user_id,
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemCreated(_) => "inventory.item.created",
            InventoryEvent::StockAdjusted(_) => "inventory.item.stock_adjusted",
            InventoryEvent::StockEdited(_) => "inventory.item.stock_edited",
            InventoryEvent::ItemDeleted(_) => "inventory.item.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemCreated(e) => e.occurred_at,
            InventoryEvent::StockAdjusted(e) => e.occurred_at,
            InventoryEvent::StockEdited(e) => e.occurred_at,
            InventoryEvent::ItemDeleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryItem {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemCreated(e) => {
                self.id = e.item_id;
                self.name = e.name.clone();
                self.stock = e.stock;
                self.stock_locations = e.locations.clone();
                self.created = true;
            }
            InventoryEvent::StockAdjusted(e) => {
                self.stock = e.new_stock;
                self.stock_locations = e.locations.clone();
            }
            InventoryEvent::StockEdited(e) => {
                self.stock = e.new_stock;
                self.stock_locations = e.locations.clone();
            }
            InventoryEvent::ItemDeleted(_) => {
                self.deleted = true;
            }
        }

        // Deterministic revision tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::CreateItem(cmd) => self.handle_create(cmd),
            InventoryCommand::AdjustStock(cmd) => self.handle_adjust(cmd),
            InventoryCommand::EditStock(cmd) => self.handle_edit(cmd),
            InventoryCommand::DeleteItem(cmd) => self.handle_delete(cmd),
        }
    }
}

impl InventoryItem {
    fn ensure_live(&self) -> Result<(), DomainError> {
        if !self.created || self.deleted {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_item_id(&self, item_id: ItemId) -> Result<(), DomainError> {
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("item already exists"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        ensure_unique_locations(&cmd.locations)?;

        Ok(vec![InventoryEvent::ItemCreated(ItemCreated {
            item_id: cmd.item_id,
            user_id: cmd.user_id,
            name: cmd.name.trim().to_string(),
            stock: ledger::effective_stock(cmd.stock, &cmd.locations),
            locations: cmd.locations.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_adjust(&self, cmd: &AdjustStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_item_id(cmd.request.item_id)?;

        let change = ledger::plan_commit(self, &cmd.request, cmd.guard)?;

        Ok(vec![InventoryEvent::StockAdjusted(StockAdjusted {
            item_id: self.id,
            user_id: cmd.user_id,
            name: self.name.clone(),
            action: cmd.request.action,
            quantity: cmd.request.quantity,
            old_stock: change.old_stock,
            new_stock: change.new_stock,
            location: cmd.request.location.clone(),
            parent_location: cmd.request.parent_location.clone(),
            provenance: cmd.request.provenance.clone(),
            locations: change.locations,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_edit(&self, cmd: &EditStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_item_id(cmd.item_id)?;
        ensure_unique_locations(&cmd.locations)?;

        Ok(vec![InventoryEvent::StockEdited(StockEdited {
            item_id: self.id,
            user_id: cmd.user_id,
            name: self.name.clone(),
            old_stock: self.stock,
            new_stock: ledger::effective_stock(cmd.stock, &cmd.locations),
            locations: cmd.locations.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteItem) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_item_id(cmd.item_id)?;

        Ok(vec![InventoryEvent::ItemDeleted(ItemDeleted {
            item_id: self.id,
            user_id: cmd.user_id,
            name: self.name.clone(),
            stock: self.stock,
            occurred_at: cmd.occurred_at,
        })])
    }
}

fn ensure_unique_locations(entries: &[StockLocationEntry]) -> Result<(), DomainError> {
    for (idx, entry) in entries.iter().enumerate() {
        if entry.location_name.trim().is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }
        if entries[..idx]
            .iter()
            .any(|e| e.location_name == entry.location_name)
        {
            return Err(DomainError::validation(format!(
                "duplicate location '{}'",
                entry.location_name
            )));
        }
    }
    Ok(())
}
