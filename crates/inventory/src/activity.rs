//! Append-only activity records: the durable audit trail of item changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{ActivityId, ItemId, UserId};

use crate::item::InventoryEvent;
use crate::ledger::AdjustAction;

/// What happened to the item as a whole.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
}

/// Kind of stock change within an update.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Add,
    Remove,
    Adjust,
}

impl From<AdjustAction> for ActionType {
    fn from(value: AdjustAction) -> Self {
        match value {
            AdjustAction::Add => ActionType::Add,
            AdjustAction::Remove => ActionType::Remove,
        }
    }
}

/// Field-level details of a change. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_stock: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_location: Option<String>,
}

/// One immutable audit entry.
///
/// Fields are private and there are no setters: once built, a record is only
/// ever read, serialised, or appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    id: ActivityId,
    inventory_id: ItemId,
    user_id: Option<UserId>,
    action: ActivityAction,
    item_name: String,
    #[serde(default)]
    changes: ActivityChanges,
    created_at: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn new(
        id: ActivityId,
        inventory_id: ItemId,
        user_id: Option<UserId>,
        action: ActivityAction,
        item_name: impl Into<String>,
        changes: ActivityChanges,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            inventory_id,
            user_id,
            action,
            item_name: item_name.into(),
            changes,
            created_at,
        }
    }

    /// Build the audit entry for one accepted inventory event.
    pub fn from_event(id: ActivityId, event: &InventoryEvent) -> Self {
        match event {
            InventoryEvent::ItemCreated(e) => Self::new(
                id,
                e.item_id,
                e.user_id,
                ActivityAction::Created,
                e.name.clone(),
                ActivityChanges {
                    stock: Some(e.stock),
                    ..ActivityChanges::default()
                },
                e.occurred_at,
            ),
            InventoryEvent::StockAdjusted(e) => Self::new(
                id,
                e.item_id,
                e.user_id,
                ActivityAction::Updated,
                e.name.clone(),
                ActivityChanges {
                    stock: Some(e.new_stock),
                    old_stock: Some(e.old_stock),
                    location: e.location.clone(),
                    action_type: Some(e.action.into()),
                    parent_location: e.parent_location.clone(),
                    recipient: e.provenance.recipient.clone(),
                    destination_location: e.provenance.destination_location.clone(),
                },
                e.occurred_at,
            ),
            InventoryEvent::StockEdited(e) => Self::new(
                id,
                e.item_id,
                e.user_id,
                ActivityAction::Updated,
                e.name.clone(),
                ActivityChanges {
                    stock: Some(e.new_stock),
                    old_stock: Some(e.old_stock),
                    action_type: Some(ActionType::Adjust),
                    ..ActivityChanges::default()
                },
                e.occurred_at,
            ),
            InventoryEvent::ItemDeleted(e) => Self::new(
                id,
                e.item_id,
                e.user_id,
                ActivityAction::Deleted,
                e.name.clone(),
                ActivityChanges {
                    old_stock: Some(e.stock),
                    ..ActivityChanges::default()
                },
                e.occurred_at,
            ),
        }
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn inventory_id(&self) -> ItemId {
        self.inventory_id
    }

    /// `None` for system-originated changes.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn action(&self) -> ActivityAction {
        self.action
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn changes(&self) -> &ActivityChanges {
        &self.changes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
