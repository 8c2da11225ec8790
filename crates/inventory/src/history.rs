//! Audit display: turns raw activity records into icons, stock deltas and
//! one-line narratives. Pure functions; missing fields degrade to less detail,
//! never to a panic.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockroom_core::{ActivityId, ItemId, UserId};

use crate::activity::{ActionType, ActivityAction, ActivityChanges, ActivityRecord};

/// Icon/category tag for a history row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryIcon {
    Add,
    Delete,
    TrendUp,
    TrendDown,
    Edit,
}

pub fn icon_for(action: ActivityAction, action_type: Option<ActionType>) -> HistoryIcon {
    match (action, action_type) {
        (ActivityAction::Created, _) => HistoryIcon::Add,
        (ActivityAction::Deleted, _) => HistoryIcon::Delete,
        (ActivityAction::Updated, Some(ActionType::Add)) => HistoryIcon::TrendUp,
        (ActivityAction::Updated, Some(ActionType::Remove)) => HistoryIcon::TrendDown,
        (ActivityAction::Updated, _) => HistoryIcon::Edit,
    }
}

/// Colour class of the signed difference chip.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipTone {
    Increase,
    Decrease,
    Neutral,
}

/// `"{old} → {new}"` plus a signed chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockDelta {
    pub old_stock: u64,
    pub new_stock: u64,
    pub difference: i128,
    pub text: String,
    pub chip: String,
    pub tone: ChipTone,
}

/// Numeric delta for a record, present only when both totals were captured.
pub fn stock_delta(changes: &ActivityChanges) -> Option<StockDelta> {
    let (old_stock, new_stock) = (changes.old_stock?, changes.stock?);
    let difference = i128::from(new_stock) - i128::from(old_stock);
    let (chip, tone) = match difference {
        d if d > 0 => (format!("+{d}"), ChipTone::Increase),
        d if d < 0 => (d.to_string(), ChipTone::Decrease),
        _ => ("0".to_string(), ChipTone::Neutral),
    };

    Some(StockDelta {
        old_stock,
        new_stock,
        difference,
        text: format!("{old_stock} → {new_stock}"),
        chip,
        tone,
    })
}

/// One display row of an item's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub activity_id: ActivityId,
    pub item_id: ItemId,
    pub user_id: Option<UserId>,
    pub icon: HistoryIcon,
    pub delta: Option<StockDelta>,
    pub narrative: String,
    pub created_at: DateTime<Utc>,
}

pub fn narrate(record: &ActivityRecord) -> HistoryEntry {
    let changes = record.changes();
    let delta = stock_delta(changes);
    let narrative = narrative_for(record, delta.as_ref());

    HistoryEntry {
        activity_id: record.id(),
        item_id: record.inventory_id(),
        user_id: record.user_id(),
        icon: icon_for(record.action(), changes.action_type),
        delta,
        narrative,
        created_at: record.created_at(),
    }
}

/// Narrate records oldest first. Records with equal timestamps keep their input order.
pub fn narrate_timeline<'a>(records: impl IntoIterator<Item = &'a ActivityRecord>) -> Vec<HistoryEntry> {
    let mut sorted: Vec<&ActivityRecord> = records.into_iter().collect();
    sorted.sort_by_key(|r| r.created_at());
    sorted.into_iter().map(narrate).collect()
}

fn narrative_for(record: &ActivityRecord, delta: Option<&StockDelta>) -> String {
    let changes = record.changes();
    let name = record.item_name();
    let amount = delta.map(|d| d.difference.unsigned_abs());

    match (record.action(), changes.action_type) {
        (ActivityAction::Created, _) => match changes.stock {
            Some(stock) => format!("Created \"{name}\" with {stock} in stock"),
            None => format!("Created \"{name}\""),
        },
        (ActivityAction::Deleted, _) => format!("Deleted \"{name}\""),
        (ActivityAction::Updated, Some(ActionType::Add)) => {
            let mut line = match amount {
                Some(n) => format!("Added {n}"),
                None => "Added stock".to_string(),
            };
            if let Some(place) = place(changes) {
                line.push_str(&format!(" to {place}"));
            }
            line
        }
        (ActivityAction::Updated, Some(ActionType::Remove)) => {
            let mut line = match amount {
                Some(n) => format!("Removed {n}"),
                None => "Removed stock".to_string(),
            };
            if let Some(place) = place(changes) {
                line.push_str(&format!(" from {place}"));
            }
            if let Some(recipient) = &changes.recipient {
                line.push_str(&format!(", given to {recipient}"));
            }
            if let Some(destination) = &changes.destination_location {
                line.push_str(&format!(", moved to {destination}"));
            }
            line
        }
        (ActivityAction::Updated, _) => match changes.stock {
            Some(stock) => format!("Set stock of \"{name}\" to {stock}"),
            None => format!("Updated \"{name}\""),
        },
    }
}

fn place(changes: &ActivityChanges) -> Option<String> {
    let location = changes.location.as_deref()?;
    Some(match changes.parent_location.as_deref() {
        Some(parent) => format!("{location} in {parent}"),
        None => location.to_string(),
    })
}
