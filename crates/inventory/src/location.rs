use serde::{Deserialize, Serialize};

use stockroom_core::{LocationId, ValueObject};

/// Quantity of one item held at one named location.
///
/// Embedded in the owning item; it has no identity beyond its position in the
/// item's location list. `parent_location_name` is denormalised when the entry is
/// written and never re-validated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLocationEntry {
    pub location_name: String,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_location_name: Option<String>,
}

impl ValueObject for StockLocationEntry {}

impl StockLocationEntry {
    pub fn new(location_name: impl Into<String>, quantity: u64) -> Self {
        Self {
            location_name: location_name.into(),
            quantity,
            parent_location_name: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_location_name = Some(parent.into());
        self
    }
}

/// A registered storage location (e.g. "Shelf A" inside "Garage").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub parent_id: Option<LocationId>,
}

impl Location {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            parent_id: None,
        }
    }

    pub fn child_of(parent: &Location, name: impl Into<String>) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            parent_id: Some(parent.id),
        }
    }
}

/// Master list of known locations, used to derive an entry's parent name.
///
/// Items may reference location names that are not registered; those simply
/// resolve to no parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationRegistry {
    locations: Vec<Location>,
}

impl LocationRegistry {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    /// Register a location created after the registry was loaded.
    pub fn insert(&mut self, location: Location) {
        self.locations.push(location);
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Location> {
        let name = name.trim();
        self.locations.iter().find(|l| l.name.trim() == name)
    }

    /// Name of the parent of the location called `name`, if both exist.
    pub fn resolve_parent(&self, name: &str) -> Option<&str> {
        let location = self.find_by_name(name)?;
        let parent = self.get(location.parent_id?)?;
        Some(parent.name.as_str())
    }

    /// Fill in missing parent names from the registry (write-time denormalisation).
    pub fn denormalize(&self, entries: Vec<StockLocationEntry>) -> Vec<StockLocationEntry> {
        entries
            .into_iter()
            .map(|mut entry| {
                if entry.parent_location_name.is_none() {
                    entry.parent_location_name =
                        self.resolve_parent(&entry.location_name).map(str::to_string);
                }
                entry
            })
            .collect()
    }
}
