//! Inventory domain module: the location-aware stock ledger.
//!
//! This crate contains business rules for stock, implemented purely as
//! deterministic domain logic (no IO, no async, no storage).

pub mod activity;
pub mod adjustment;
pub mod history;
pub mod item;
pub mod ledger;
pub mod location;

pub use activity::{ActionType, ActivityAction, ActivityChanges, ActivityRecord};
pub use adjustment::{AdjustmentMode, AdjustmentSession, DigitBuffer, Provenance, SaveAdjustment};
pub use history::{ChipTone, HistoryEntry, HistoryIcon, StockDelta, narrate, narrate_timeline};
pub use item::{
    AdjustStock, CreateItem, DeleteItem, EditStock, InventoryCommand, InventoryEvent,
    InventoryItem, ItemCreated, ItemDeleted, StockAdjusted, StockEdited,
};
pub use ledger::{AdjustAction, LedgerChange, Quantity, RemovalGuard};
pub use location::{Location, LocationRegistry, StockLocationEntry};
