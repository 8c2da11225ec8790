//! Interactive stock adjustment workflow, independent of any UI toolkit.
//!
//! ```text
//!            choose(add|remove)
//!   Menu ──────────────────────────┬──────────────► Add | Remove ──confirm──► (closed)
//!     ▲                            │ tracked item         ▲   │
//!     │ back                       ▼                      │   │ back
//!     └──────────────────── SelectLocation ──select───────┘   │
//!                                  ▲                          │
//!                                  └──────────────────────────┘
//! ```
//!
//! The session never talks to storage. `confirm` produces a [`SaveAdjustment`]
//! and raises the `loading` flag; the host performs the save and reports the
//! outcome through `complete`. A failed save leaves the session open for retry.

use serde::{Deserialize, Serialize};

use stockroom_core::{AggregateRoot, DomainError, DomainResult, ItemId, ValueObject};

use crate::item::InventoryItem;
use crate::ledger::{self, AdjustAction, MAX_INPUT_DIGITS, Quantity};
use crate::location::{LocationRegistry, StockLocationEntry};

/// Where the workflow currently is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AdjustmentMode {
    Menu,
    SelectLocation,
    Add,
    Remove,
}

impl AdjustmentMode {
    fn for_action(action: AdjustAction) -> Self {
        match action {
            AdjustAction::Add => AdjustmentMode::Add,
            AdjustAction::Remove => AdjustmentMode::Remove,
        }
    }

    fn action(self) -> Option<AdjustAction> {
        match self {
            AdjustmentMode::Add => Some(AdjustAction::Add),
            AdjustmentMode::Remove => Some(AdjustAction::Remove),
            AdjustmentMode::Menu | AdjustmentMode::SelectLocation => None,
        }
    }
}

/// Keypad buffer: ASCII digits only, at most [`MAX_INPUT_DIGITS`] of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigitBuffer(String);

impl DigitBuffer {
    /// Append one digit. Returns `false` (buffer unchanged) for non-digits or
    /// when the buffer is full.
    pub fn push(&mut self, ch: char) -> bool {
        if !ch.is_ascii_digit() || self.0.len() >= MAX_INPUT_DIGITS {
            return false;
        }
        self.0.push(ch);
        true
    }

    pub fn backspace(&mut self) -> bool {
        self.0.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric value of the buffer; 0 when empty.
    pub fn value(&self) -> u32 {
        self.0.parse().unwrap_or(0)
    }

    pub fn quantity(&self) -> Option<Quantity> {
        Quantity::parse(&self.0).ok()
    }
}

/// Optional free-text context attached to a removal: who got it, where it went.
///
/// Deliberately unvalidated; blank strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_location: Option<String>,
}

impl ValueObject for Provenance {}

impl Provenance {
    pub fn new(recipient: Option<&str>, destination_location: Option<&str>) -> Self {
        Self {
            recipient: non_blank(recipient),
            destination_location: non_blank(destination_location),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recipient.is_none() && self.destination_location.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A confirmed adjustment, ready to be persisted.
///
/// `new_stock` is the total computed by the session; `quantity` is the amount the
/// user entered, which the store applies to the affected location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveAdjustment {
    pub item_id: ItemId,
    pub new_stock: u64,
    pub quantity: u32,
    pub action: AdjustAction,
    pub location: Option<String>,
    pub parent_location: Option<String>,
    pub provenance: Provenance,
    /// Item revision the session saw; only checked when optimistic writes are on.
    pub expected_revision: Option<u64>,
}

/// Ephemeral state of one open adjustment dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentSession {
    mode: AdjustmentMode,
    pending_action: Option<AdjustAction>,
    selected_location: Option<String>,
    input: DigitBuffer,
    recipient: String,
    destination_location: String,
    loading: bool,
    open: bool,
}

impl Default for AdjustmentSession {
    fn default() -> Self {
        Self::open()
    }
}

impl AdjustmentSession {
    /// Open a fresh session in the menu.
    pub fn open() -> Self {
        Self {
            mode: AdjustmentMode::Menu,
            pending_action: None,
            selected_location: None,
            input: DigitBuffer::default(),
            recipient: String::new(),
            destination_location: String::new(),
            loading: false,
            open: true,
        }
    }

    pub fn mode(&self) -> AdjustmentMode {
        self.mode
    }

    pub fn pending_action(&self) -> Option<AdjustAction> {
        self.pending_action
    }

    pub fn selected_location(&self) -> Option<&str> {
        self.selected_location.as_deref()
    }

    pub fn input(&self) -> &str {
        self.input.as_str()
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn destination_location(&self) -> &str {
        &self.destination_location
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_idle(&self) -> DomainResult<()> {
        if !self.open {
            return Err(DomainError::validation("adjustment session is closed"));
        }
        if self.loading {
            return Err(DomainError::validation("a save is already in progress"));
        }
        Ok(())
    }

    fn is_editing(&self) -> bool {
        self.open && !self.loading && self.mode.action().is_some()
    }

    /// Pick the intended action from the menu.
    ///
    /// Location-tracked items go through location selection first; others go
    /// straight to quantity entry.
    pub fn choose(&mut self, item: &InventoryItem, action: AdjustAction) -> DomainResult<()> {
        self.ensure_idle()?;
        if self.mode != AdjustmentMode::Menu {
            return Err(DomainError::validation("an action can only be chosen from the menu"));
        }

        self.pending_action = Some(action);
        self.mode = if item.is_location_tracked() {
            AdjustmentMode::SelectLocation
        } else {
            AdjustmentMode::for_action(action)
        };
        Ok(())
    }

    /// Locations offered in the selection step, with their local quantities.
    pub fn location_choices<'a>(&self, item: &'a InventoryItem) -> &'a [StockLocationEntry] {
        item.stock_locations()
    }

    pub fn select_location(&mut self, item: &InventoryItem, name: &str) -> DomainResult<()> {
        self.ensure_idle()?;
        if self.mode != AdjustmentMode::SelectLocation {
            return Err(DomainError::validation("no location selection in progress"));
        }
        let action = self
            .pending_action
            .ok_or_else(|| DomainError::validation("no action chosen"))?;
        if item.find_location(name).is_none() {
            return Err(DomainError::validation(format!(
                "item is not stocked at location '{name}'"
            )));
        }

        self.selected_location = Some(name.to_string());
        self.mode = AdjustmentMode::for_action(action);
        Ok(())
    }

    /// Keypad digit. No-op (returns `false`) outside quantity entry, while
    /// saving, for non-digits, and once five digits are entered.
    pub fn push_digit(&mut self, ch: char) -> bool {
        self.is_editing() && self.input.push(ch)
    }

    pub fn backspace(&mut self) -> bool {
        self.is_editing() && self.input.backspace()
    }

    pub fn clear_input(&mut self) {
        if self.is_editing() {
            self.input.clear();
        }
    }

    /// Who receives removed stock. Only collected in remove mode.
    pub fn set_recipient(&mut self, value: &str) -> bool {
        if !self.is_editing() || self.mode != AdjustmentMode::Remove {
            return false;
        }
        self.recipient = value.to_string();
        true
    }

    /// Where removed stock is going. Only collected in remove mode.
    pub fn set_destination_location(&mut self, value: &str) -> bool {
        if !self.is_editing() || self.mode != AdjustmentMode::Remove {
            return false;
        }
        self.destination_location = value.to_string();
        true
    }

    /// The entry for the selected location as it is on `item` now.
    pub fn selected_entry<'a>(&self, item: &'a InventoryItem) -> Option<&'a StockLocationEntry> {
        self.selected_location
            .as_deref()
            .and_then(|name| item.find_location(name))
    }

    /// Removal limit for the current selection.
    ///
    /// A selected location that has since disappeared from the item allows nothing.
    pub fn max_removable(&self, item: &InventoryItem) -> u64 {
        match (&self.selected_location, self.selected_entry(item)) {
            (Some(_), None) => 0,
            (_, entry) => ledger::max_removable(item, entry),
        }
    }

    /// Whether the "insufficient stock" warning should be shown.
    pub fn insufficient_stock(&self, item: &InventoryItem) -> bool {
        self.mode == AdjustmentMode::Remove
            && u64::from(self.input.value()) > self.max_removable(item)
    }

    /// Whether the confirm control is enabled.
    pub fn can_confirm(&self, item: &InventoryItem) -> bool {
        self.is_editing()
            && self.input.quantity().is_some()
            && !self.insufficient_stock(item)
            && (self.selected_location.is_none() || self.selected_entry(item).is_some())
    }

    /// Turn the entered adjustment into a save request and mark the session busy.
    pub fn confirm(
        &mut self,
        item: &InventoryItem,
        registry: &LocationRegistry,
    ) -> DomainResult<SaveAdjustment> {
        if !self.can_confirm(item) {
            return Err(DomainError::validation("adjustment cannot be confirmed"));
        }
        let action = self
            .mode
            .action()
            .ok_or_else(|| DomainError::validation("no action chosen"))?;
        let quantity = Quantity::parse(self.input.as_str())?;

        let entry = self.selected_entry(item);
        let parent_location = entry.and_then(|e| {
            e.parent_location_name
                .clone()
                .or_else(|| registry.resolve_parent(&e.location_name).map(str::to_string))
        });
        let provenance = match action {
            AdjustAction::Remove => Provenance::new(
                Some(&self.recipient),
                Some(&self.destination_location),
            ),
            AdjustAction::Add => Provenance::default(),
        };

        let request = SaveAdjustment {
            item_id: item.id_typed(),
            new_stock: ledger::compute_new_total(item, action, quantity),
            quantity: quantity.get(),
            action,
            location: entry.map(|e| e.location_name.clone()),
            parent_location,
            provenance,
            expected_revision: Some(item.version()),
        };

        self.loading = true;
        Ok(request)
    }

    /// Report the outcome of the save started by `confirm`.
    ///
    /// Success resets and closes the session; failure only clears `loading`.
    pub fn complete<E>(&mut self, result: &Result<(), E>) {
        if !self.loading {
            return;
        }
        self.loading = false;
        if result.is_ok() {
            self.close();
        }
    }

    /// Step back one screen. Returns `false` when there is nowhere to go.
    pub fn back(&mut self, item: &InventoryItem) -> bool {
        if !self.open || self.loading {
            return false;
        }
        match self.mode {
            AdjustmentMode::Add | AdjustmentMode::Remove => {
                self.clear_entry();
                self.selected_location = None;
                if item.is_location_tracked() {
                    self.mode = AdjustmentMode::SelectLocation;
                } else {
                    self.mode = AdjustmentMode::Menu;
                    self.pending_action = None;
                }
                true
            }
            AdjustmentMode::SelectLocation => {
                self.mode = AdjustmentMode::Menu;
                self.pending_action = None;
                self.selected_location = None;
                true
            }
            AdjustmentMode::Menu => false,
        }
    }

    /// Discard the session. Nothing is persisted.
    pub fn close(&mut self) {
        *self = Self {
            open: false,
            ..Self::open()
        };
    }

    fn clear_entry(&mut self) {
        self.input.clear();
        self.recipient.clear();
        self.destination_location.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use proptest::prelude::*;

    fn plain_item(stock: u64) -> InventoryItem {
        InventoryItem::restore(ItemId::new(), "Screws", stock, vec![], 3)
    }

    fn shelf_item() -> InventoryItem {
        InventoryItem::restore(
            ItemId::new(),
            "Screws",
            10,
            vec![StockLocationEntry::new("Shelf A", 5)],
            3,
        )
    }

    fn type_digits(session: &mut AdjustmentSession, digits: &str) {
        for ch in digits.chars() {
            session.push_digit(ch);
        }
    }

    #[test]
    fn untracked_item_skips_location_selection() {
        let item = plain_item(10);
        let mut s = AdjustmentSession::open();

        s.choose(&item, AdjustAction::Add).unwrap();

        assert_eq!(s.mode(), AdjustmentMode::Add);
        assert_eq!(s.pending_action(), Some(AdjustAction::Add));
    }

    #[test]
    fn add_to_untracked_item_builds_request() {
        let item = plain_item(10);
        let mut s = AdjustmentSession::open();
        s.choose(&item, AdjustAction::Add).unwrap();
        type_digits(&mut s, "12");

        let req = s.confirm(&item, &LocationRegistry::default()).unwrap();

        assert_eq!(req.item_id, item.id_typed());
        assert_eq!(req.new_stock, 22);
        assert_eq!(req.quantity, 12);
        assert_eq!(req.action, AdjustAction::Add);
        assert_eq!(req.location, None);
        assert_eq!(req.expected_revision, Some(3));
        assert!(s.is_loading());
        assert!(!s.can_confirm(&item));
    }

    #[test]
    fn remove_from_tracked_item_goes_through_selection() {
        let item = shelf_item();
        let mut s = AdjustmentSession::open();

        s.choose(&item, AdjustAction::Remove).unwrap();
        assert_eq!(s.mode(), AdjustmentMode::SelectLocation);
        assert_eq!(s.location_choices(&item).len(), 1);

        s.select_location(&item, "Shelf A").unwrap();
        assert_eq!(s.mode(), AdjustmentMode::Remove);
        type_digits(&mut s, "2");

        let req = s.confirm(&item, &LocationRegistry::default()).unwrap();
        assert_eq!(req.new_stock, 8);
        assert_eq!(req.location.as_deref(), Some("Shelf A"));
        assert_eq!(req.action, AdjustAction::Remove);
    }

    #[test]
    fn removal_beyond_location_quantity_is_blocked() {
        let item = shelf_item();
        let mut s = AdjustmentSession::open();
        s.choose(&item, AdjustAction::Remove).unwrap();
        s.select_location(&item, "Shelf A").unwrap();
        type_digits(&mut s, "15");

        assert!(s.insufficient_stock(&item));
        assert!(!s.can_confirm(&item));
        assert!(s.confirm(&item, &LocationRegistry::default()).is_err());
        assert!(!s.is_loading());
    }

    #[test]
    fn empty_and_zero_input_cannot_be_confirmed() {
        let item = plain_item(10);
        let mut s = AdjustmentSession::open();
        s.choose(&item, AdjustAction::Add).unwrap();
        assert!(!s.can_confirm(&item));

        type_digits(&mut s, "00");
        assert!(!s.can_confirm(&item));
    }

    #[test]
    fn sixth_digit_is_ignored() {
        let item = plain_item(0);
        let mut s = AdjustmentSession::open();
        s.choose(&item, AdjustAction::Add).unwrap();
        type_digits(&mut s, "12345");

        assert!(!s.push_digit('6'));
        assert_eq!(s.input(), "12345");
    }

    #[test]
    fn keypad_is_inert_outside_quantity_entry() {
        let item = shelf_item();
        let mut s = AdjustmentSession::open();
        assert!(!s.push_digit('1'));

        s.choose(&item, AdjustAction::Add).unwrap();
        assert!(!s.push_digit('1'));
        assert!(!s.push_digit('x'));
        assert_eq!(s.input(), "");
    }

    #[test]
    fn provenance_is_only_collected_when_removing() {
        let item = plain_item(10);
        let mut s = AdjustmentSession::open();
        s.choose(&item, AdjustAction::Add).unwrap();
        assert!(!s.set_recipient("Bob"));

        s.back(&item);
        s.choose(&item, AdjustAction::Remove).unwrap();
        assert!(s.set_recipient("  Bob "));
        assert!(s.set_destination_location(""));
        type_digits(&mut s, "1");

        let req = s.confirm(&item, &LocationRegistry::default()).unwrap();
        assert_eq!(req.provenance.recipient.as_deref(), Some("Bob"));
        assert_eq!(req.provenance.destination_location, None);
    }

    #[test]
    fn parent_location_comes_from_registry_when_missing() {
        let garage = Location::root("Garage");
        let shelf = Location::child_of(&garage, "Shelf A");
        let registry = LocationRegistry::new(vec![garage, shelf]);

        let item = shelf_item();
        let mut s = AdjustmentSession::open();
        s.choose(&item, AdjustAction::Add).unwrap();
        s.select_location(&item, "Shelf A").unwrap();
        type_digits(&mut s, "1");

        let req = s.confirm(&item, &registry).unwrap();
        assert_eq!(req.parent_location.as_deref(), Some("Garage"));
    }

    #[test]
    fn back_navigation_follows_tracking() {
        let tracked = shelf_item();
        let mut s = AdjustmentSession::open();
        s.choose(&tracked, AdjustAction::Remove).unwrap();
        s.select_location(&tracked, "Shelf A").unwrap();
        type_digits(&mut s, "3");

        assert!(s.back(&tracked));
        assert_eq!(s.mode(), AdjustmentMode::SelectLocation);
        assert_eq!(s.pending_action(), Some(AdjustAction::Remove));
        assert_eq!(s.input(), "");

        assert!(s.back(&tracked));
        assert_eq!(s.mode(), AdjustmentMode::Menu);
        assert_eq!(s.pending_action(), None);
        assert!(!s.back(&tracked));

        let plain = plain_item(4);
        s.choose(&plain, AdjustAction::Add).unwrap();
        assert!(s.back(&plain));
        assert_eq!(s.mode(), AdjustmentMode::Menu);
    }

    #[test]
    fn failed_save_keeps_session_open_for_retry() {
        let item = plain_item(10);
        let mut s = AdjustmentSession::open();
        s.choose(&item, AdjustAction::Add).unwrap();
        type_digits(&mut s, "4");
        s.confirm(&item, &LocationRegistry::default()).unwrap();

        s.complete(&Err::<(), _>("network down"));

        assert!(s.is_open());
        assert!(!s.is_loading());
        assert_eq!(s.mode(), AdjustmentMode::Add);
        assert_eq!(s.input(), "4");
        assert!(s.can_confirm(&item));
    }

    #[test]
    fn successful_save_resets_and_closes() {
        let item = plain_item(10);
        let mut s = AdjustmentSession::open();
        s.choose(&item, AdjustAction::Add).unwrap();
        type_digits(&mut s, "4");
        s.confirm(&item, &LocationRegistry::default()).unwrap();

        s.complete(&Ok::<(), ()>(()));

        assert!(!s.is_open());
        assert_eq!(s.mode(), AdjustmentMode::Menu);
        assert_eq!(s.input(), "");
    }

    #[test]
    fn navigation_is_frozen_while_saving() {
        let item = plain_item(10);
        let mut s = AdjustmentSession::open();
        s.choose(&item, AdjustAction::Add).unwrap();
        type_digits(&mut s, "4");
        s.confirm(&item, &LocationRegistry::default()).unwrap();

        assert!(!s.back(&item));
        assert!(!s.push_digit('1'));
        assert!(s.confirm(&item, &LocationRegistry::default()).is_err());
    }

    #[test]
    fn vanished_location_disables_confirmation() {
        let item = shelf_item();
        let mut s = AdjustmentSession::open();
        s.choose(&item, AdjustAction::Add).unwrap();
        s.select_location(&item, "Shelf A").unwrap();
        type_digits(&mut s, "1");

        let edited = InventoryItem::restore(item.id_typed(), "Screws", 10, vec![], 4);
        assert!(!s.can_confirm(&edited));
    }

    proptest! {
        /// Property: the buffer never grows past five digits, whatever is typed.
        #[test]
        fn digit_buffer_is_bounded(keys in prop::collection::vec(any::<char>(), 0..40)) {
            let mut buf = DigitBuffer::default();
            for k in keys {
                let before = buf.clone();
                let changed = buf.push(k);
                if !changed {
                    prop_assert_eq!(&buf, &before);
                }
                prop_assert!(buf.as_str().len() <= MAX_INPUT_DIGITS);
                prop_assert!(buf.as_str().bytes().all(|b| b.is_ascii_digit()));
            }
        }
    }
}
