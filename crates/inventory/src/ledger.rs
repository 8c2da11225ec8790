//! Stock ledger model: aggregate totals, per-location distribution, and the
//! reconciliation invariant (`stock == Σ location quantities` for tracked items).
//!
//! Everything here is a pure function of its inputs. The adjustment workflow uses
//! it to compute what to save; the item aggregate uses it to decide what a save
//! does to the stored distribution.

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult};

use crate::adjustment::SaveAdjustment;
use crate::item::InventoryItem;
use crate::location::StockLocationEntry;

/// Longest digit string the keypad accepts.
pub const MAX_INPUT_DIGITS: usize = 5;

/// Largest quantity a single adjustment can carry (five nines).
pub const MAX_QUANTITY: u32 = 99_999;

/// Direction of a user-initiated adjustment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustAction {
    Add,
    Remove,
}

impl AdjustAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustAction::Add => "add",
            AdjustAction::Remove => "remove",
        }
    }
}

/// A validated adjustment amount in `1..=MAX_QUANTITY`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> DomainResult<Self> {
        if value == 0 {
            return Err(DomainError::validation("quantity must be greater than zero"));
        }
        if value > MAX_QUANTITY {
            return Err(DomainError::validation(format!(
                "quantity cannot exceed {MAX_QUANTITY}"
            )));
        }
        Ok(Self(value))
    }

    /// Parse keypad input: 1 to 5 ASCII digits, not all zero.
    pub fn parse(input: &str) -> DomainResult<Self> {
        if input.is_empty() {
            return Err(DomainError::validation("quantity is required"));
        }
        if input.len() > MAX_INPUT_DIGITS {
            return Err(DomainError::validation(format!(
                "quantity cannot have more than {MAX_INPUT_DIGITS} digits"
            )));
        }
        if !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation("quantity must be digits only"));
        }
        let value: u32 = input
            .parse()
            .map_err(|e| DomainError::validation(format!("invalid quantity: {e}")))?;
        Self::new(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    fn as_stock(self) -> u64 {
        u64::from(self.0)
    }
}

/// How strictly the data layer treats removals beyond what is on hand.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalGuard {
    /// The limit is a UI hint only; over-removal floors at zero and untracked
    /// saves keep the requested total.
    #[default]
    Advisory,
    /// The store recomputes the total itself and rejects over-removal.
    Enforced,
}

/// Apply one signed adjustment to a quantity. Removal floors at zero.
pub fn apply_delta(quantity: u64, action: AdjustAction, delta: Quantity) -> u64 {
    match action {
        AdjustAction::Add => quantity.saturating_add(delta.as_stock()),
        AdjustAction::Remove => quantity.saturating_sub(delta.as_stock()),
    }
}

/// New aggregate stock after adjusting `item` by `delta`.
pub fn compute_new_total(item: &InventoryItem, action: AdjustAction, delta: Quantity) -> u64 {
    apply_delta(item.stock(), action, delta)
}

/// Upper bound the workflow allows for a removal.
///
/// The selected location's quantity when one is selected, the aggregate stock
/// otherwise. Advisory: location quantities and aggregate stock can be edited
/// independently elsewhere, so this is not a data-layer invariant.
pub fn max_removable(item: &InventoryItem, selected: Option<&StockLocationEntry>) -> u64 {
    match selected {
        Some(entry) => entry.quantity,
        None => item.stock(),
    }
}

pub fn location_total(entries: &[StockLocationEntry]) -> u64 {
    entries
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.quantity))
}

/// Check the reconciliation invariant for a stock total and its distribution.
pub fn check_reconciled(stock: u64, entries: &[StockLocationEntry]) -> DomainResult<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let total = location_total(entries);
    if total != stock {
        return Err(DomainError::unreconciled(total, stock));
    }
    Ok(())
}

/// Stock implied by a direct edit: the location sum when tracked, `stock` otherwise.
pub fn effective_stock(stock: u64, entries: &[StockLocationEntry]) -> u64 {
    if entries.is_empty() {
        stock
    } else {
        location_total(entries)
    }
}

/// Result of committing one adjustment to a stored item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerChange {
    pub old_stock: u64,
    pub new_stock: u64,
    pub locations: Vec<StockLocationEntry>,
}

/// Decide what a saved adjustment does to `item`.
///
/// The affected location and the aggregate both move by the entered amount from
/// the stored snapshot, so a reconciled item stays reconciled as long as the
/// removal stayed within `max_removable`. Only untracked saves under
/// [`RemovalGuard::Advisory`] take the requested total as-is.
pub fn plan_commit(
    item: &InventoryItem,
    request: &SaveAdjustment,
    guard: RemovalGuard,
) -> DomainResult<LedgerChange> {
    let quantity = Quantity::new(request.quantity)?;
    let mut locations = item.stock_locations().to_vec();

    let entry_idx = match request.location.as_deref() {
        Some(name) => Some(
            locations
                .iter()
                .position(|e| e.location_name == name)
                .ok_or_else(|| {
                    DomainError::validation(format!("item is not stocked at location '{name}'"))
                })?,
        ),
        None => None,
    };

    if guard == RemovalGuard::Enforced {
        if entry_idx.is_none() && item.is_location_tracked() {
            return Err(DomainError::validation(
                "a location is required for location-tracked items",
            ));
        }
        if request.action == AdjustAction::Remove {
            let limit = max_removable(item, entry_idx.map(|i| &locations[i]));
            if quantity.as_stock() > limit {
                return Err(DomainError::insufficient_stock(quantity.as_stock(), limit));
            }
        }
    }

    // A location-scoped total is always recomputed from the loaded stock: the
    // entry below moves from the loaded distribution, so a client total taken
    // from an older snapshot would leave the two out of step.
    let new_stock = match (guard, entry_idx) {
        (RemovalGuard::Advisory, None) => request.new_stock,
        _ => compute_new_total(item, request.action, quantity),
    };

    if let Some(idx) = entry_idx {
        let entry = &mut locations[idx];
        entry.quantity = apply_delta(entry.quantity, request.action, quantity);
        if entry.parent_location_name.is_none() {
            entry.parent_location_name = request.parent_location.clone();
        }
    }

    Ok(LedgerChange {
        old_stock: item.stock(),
        new_stock,
        locations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustment::Provenance;
    use proptest::prelude::*;
    use stockroom_core::ItemId;

    fn item(stock: u64, locations: Vec<StockLocationEntry>) -> InventoryItem {
        InventoryItem::restore(ItemId::new(), "Batteries", stock, locations, 1)
    }

    fn request(item: &InventoryItem, action: AdjustAction, qty: u32, location: Option<&str>) -> SaveAdjustment {
        let quantity = Quantity::new(qty).unwrap();
        SaveAdjustment {
            item_id: item.id_typed(),
            new_stock: compute_new_total(item, action, quantity),
            quantity: qty,
            action,
            location: location.map(str::to_string),
            parent_location: None,
            provenance: Provenance::default(),
            expected_revision: None,
        }
    }

    #[test]
    fn quantity_parse_rejects_empty_zero_and_non_digits() {
        assert!(Quantity::parse("").is_err());
        assert!(Quantity::parse("0").is_err());
        assert!(Quantity::parse("000").is_err());
        assert!(Quantity::parse("1a").is_err());
        assert!(Quantity::parse("-3").is_err());
        assert!(Quantity::parse("123456").is_err());
        assert_eq!(Quantity::parse("007").unwrap().get(), 7);
        assert_eq!(Quantity::parse("99999").unwrap().get(), MAX_QUANTITY);
    }

    #[test]
    fn add_has_no_upper_bound() {
        let it = item(u64::MAX - 1, vec![]);
        let q = Quantity::new(5).unwrap();
        assert_eq!(compute_new_total(&it, AdjustAction::Add, q), u64::MAX);
    }

    #[test]
    fn remove_floors_at_zero() {
        let it = item(3, vec![]);
        let q = Quantity::new(10).unwrap();
        assert_eq!(compute_new_total(&it, AdjustAction::Remove, q), 0);
    }

    #[test]
    fn max_removable_prefers_selected_location() {
        let shelf = StockLocationEntry::new("Shelf A", 5);
        let it = item(10, vec![shelf.clone()]);
        assert_eq!(max_removable(&it, Some(&shelf)), 5);
        assert_eq!(max_removable(&it, None), 10);
    }

    #[test]
    fn reconciliation_reports_both_totals() {
        let entries = vec![StockLocationEntry::new("A", 2), StockLocationEntry::new("B", 3)];
        assert!(check_reconciled(5, &entries).is_ok());
        assert!(check_reconciled(99, &[]).is_ok());

        let err = check_reconciled(6, &entries).unwrap_err();
        assert_eq!(
            err,
            DomainError::invariant("location quantities sum to 5, but stock is 6")
        );
    }

    #[test]
    fn commit_moves_location_and_total_together() {
        let it = item(
            8,
            vec![StockLocationEntry::new("Shelf A", 5), StockLocationEntry::new("Bin", 3)],
        );
        let mut req = request(&it, AdjustAction::Remove, 2, Some("Shelf A"));
        req.parent_location = Some("Garage".to_string());

        let change = plan_commit(&it, &req, RemovalGuard::Advisory).unwrap();

        assert_eq!(change.old_stock, 8);
        assert_eq!(change.new_stock, 6);
        assert_eq!(change.locations[0].quantity, 3);
        assert_eq!(change.locations[0].parent_location_name.as_deref(), Some("Garage"));
        assert_eq!(change.locations[1].quantity, 3);
        assert!(check_reconciled(change.new_stock, &change.locations).is_ok());
    }

    #[test]
    fn commit_rejects_unknown_location() {
        let it = item(5, vec![StockLocationEntry::new("Shelf A", 5)]);
        let req = request(&it, AdjustAction::Add, 1, Some("Attic"));
        let err = plan_commit(&it, &req, RemovalGuard::Advisory).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn advisory_guard_lets_over_removal_through_and_floors_location() {
        let it = item(10, vec![StockLocationEntry::new("Shelf A", 5)]);
        // Bypasses the UI limit (5) for the selected location.
        let req = request(&it, AdjustAction::Remove, 7, Some("Shelf A"));

        let change = plan_commit(&it, &req, RemovalGuard::Advisory).unwrap();

        assert_eq!(change.new_stock, 3);
        assert_eq!(change.locations[0].quantity, 0);
    }

    #[test]
    fn location_commit_ignores_a_stale_requested_total() {
        // Another session already took 2 from Bin after this request was built.
        let before = item(
            10,
            vec![StockLocationEntry::new("Shelf A", 5), StockLocationEntry::new("Bin", 5)],
        );
        let req = request(&before, AdjustAction::Remove, 1, Some("Shelf A"));
        let now = item(
            8,
            vec![StockLocationEntry::new("Shelf A", 5), StockLocationEntry::new("Bin", 3)],
        );

        let change = plan_commit(&now, &req, RemovalGuard::Advisory).unwrap();

        assert_eq!(req.new_stock, 9);
        assert_eq!(change.new_stock, 7);
        assert_eq!(change.locations[0].quantity, 4);
        assert!(check_reconciled(change.new_stock, &change.locations).is_ok());
    }

    #[test]
    fn untracked_advisory_save_keeps_requested_total() {
        let it = item(10, vec![]);
        let mut req = request(&it, AdjustAction::Add, 1, None);
        req.new_stock = 4;

        let change = plan_commit(&it, &req, RemovalGuard::Advisory).unwrap();
        assert_eq!(change.new_stock, 4);
    }

    #[test]
    fn enforced_guard_rejects_over_removal() {
        let it = item(10, vec![StockLocationEntry::new("Shelf A", 5)]);
        let req = request(&it, AdjustAction::Remove, 7, Some("Shelf A"));

        let err = plan_commit(&it, &req, RemovalGuard::Enforced).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("insufficient stock")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn enforced_guard_recomputes_total_from_stored_stock() {
        let it = item(10, vec![]);
        let mut req = request(&it, AdjustAction::Add, 4, None);
        req.new_stock = 1_000;

        let change = plan_commit(&it, &req, RemovalGuard::Enforced).unwrap();
        assert_eq!(change.new_stock, 14);
    }

    #[test]
    fn enforced_guard_requires_location_for_tracked_items() {
        let it = item(5, vec![StockLocationEntry::new("Shelf A", 5)]);
        let req = request(&it, AdjustAction::Add, 1, None);
        assert!(plan_commit(&it, &req, RemovalGuard::Enforced).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: removing never yields negative stock.
        #[test]
        fn remove_is_clamped(stock in 0u64..200_000, delta in 1u32..=MAX_QUANTITY) {
            let it = item(stock, vec![]);
            let q = Quantity::new(delta).unwrap();
            let expected = stock.saturating_sub(u64::from(delta));
            prop_assert_eq!(compute_new_total(&it, AdjustAction::Remove, q), expected);
        }

        /// Property: for reconciled items, committing any in-bounds adjustment
        /// keeps location quantities summing to the stock.
        #[test]
        fn commits_preserve_reconciliation(
            quantities in prop::collection::vec(0u64..1_000, 1..6),
            pick in 0usize..6,
            add in any::<bool>(),
            amount in 1u32..2_000,
        ) {
            let entries: Vec<_> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| StockLocationEntry::new(format!("L{i}"), *q))
                .collect();
            let stock = location_total(&entries);
            let it = item(stock, entries.clone());

            let idx = pick % entries.len();
            let action = if add { AdjustAction::Add } else { AdjustAction::Remove };
            prop_assume!(action == AdjustAction::Add || u64::from(amount) <= entries[idx].quantity);

            let req = request(&it, action, amount, Some(&entries[idx].location_name));
            for guard in [RemovalGuard::Advisory, RemovalGuard::Enforced] {
                let change = plan_commit(&it, &req, guard).unwrap();
                prop_assert!(check_reconciled(change.new_stock, &change.locations).is_ok());
            }
        }
    }
}
