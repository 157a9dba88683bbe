//! Static production data for every buildable item type.
//!
//! Catalog entries are data-driven definitions loaded from configuration.
//! The scheduler only ever reads them; nothing in a running queue mutates
//! the catalog.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Unique identifier for a buildable item type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new item identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Production data for a single item type.
///
/// # Example RON
///
/// ```ron
/// CatalogEntry(
///     id: "light_tank",
///     cost: 700,
///     build_duration: Some(420),
///     count: 1,
///     build_limit: 0,
///     queues: ["Vehicle"],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique identifier for this item type.
    pub id: ItemId,

    /// Resource cost of one purchase.
    pub cost: i32,

    /// Nominal build time in ticks. When absent the cost doubles as the
    /// build time.
    #[serde(default)]
    pub build_duration: Option<u32>,

    /// Percentage applied to the build time (100 = unchanged).
    #[serde(default = "default_percent")]
    pub build_duration_modifier: u32,

    /// Number of units delivered per purchase.
    #[serde(default = "default_count")]
    pub count: u32,

    /// Maximum number owned plus queued (0 = unlimited).
    #[serde(default)]
    pub build_limit: u32,

    /// Queue categories allowed to build this item.
    #[serde(default)]
    pub queues: Vec<String>,

    /// Production category handed to the producer instead of the queue type.
    #[serde(default)]
    pub build_at_production_type: Option<String>,

    /// Faction the produced item starts with, instead of the queue's.
    #[serde(default)]
    pub initial_faction: Option<String>,

    /// Structures wait in the queue for external placement instead of being
    /// handed to the producer.
    #[serde(default)]
    pub is_structure: bool,
}

const fn default_percent() -> u32 {
    100
}

const fn default_count() -> u32 {
    1
}

impl CatalogEntry {
    /// Create a new entry buildable in a single queue category.
    #[must_use]
    pub fn new(
        id: impl Into<ItemId>,
        cost: i32,
        build_duration: u32,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            cost,
            build_duration: Some(build_duration),
            build_duration_modifier: default_percent(),
            count: default_count(),
            build_limit: 0,
            queues: vec![queue.into()],
            build_at_production_type: None,
            initial_faction: None,
            is_structure: false,
        }
    }

    /// Set the number of units delivered per purchase.
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Set the owned-plus-queued build limit.
    #[must_use]
    pub fn with_build_limit(mut self, limit: u32) -> Self {
        self.build_limit = limit;
        self
    }

    /// Allow an additional queue category.
    #[must_use]
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queues.push(queue.into());
        self
    }

    /// Set the build duration percentage.
    #[must_use]
    pub fn with_duration_modifier(mut self, percent: u32) -> Self {
        self.build_duration_modifier = percent;
        self
    }

    /// Derive the build time from the cost.
    #[must_use]
    pub fn with_cost_derived_duration(mut self) -> Self {
        self.build_duration = None;
        self
    }

    /// Hand the item to producers of a different category.
    #[must_use]
    pub fn built_at(mut self, category: impl Into<String>) -> Self {
        self.build_at_production_type = Some(category.into());
        self
    }

    /// Force the faction of the produced item.
    #[must_use]
    pub fn with_initial_faction(mut self, faction: impl Into<String>) -> Self {
        self.initial_faction = Some(faction.into());
        self
    }

    /// Mark the item as a structure awaiting manual placement.
    #[must_use]
    pub fn structure(mut self) -> Self {
        self.is_structure = true;
        self
    }

    /// Check if a queue of this category may build the item.
    #[must_use]
    pub fn produced_in(&self, category: &str) -> bool {
        self.queues.iter().any(|q| q == category)
    }

    /// Unmodified build time in ticks.
    #[must_use]
    pub fn base_build_time(&self) -> u32 {
        self.build_duration
            .unwrap_or_else(|| u32::try_from(self.cost).unwrap_or(0))
    }

    /// Check the entry for load-time errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::InvalidPerPurchaseCount(self.id.to_string()));
        }
        if self.cost < 0 {
            return Err(ConfigError::NegativeCost(self.id.to_string()));
        }
        Ok(())
    }
}

/// Registry of every catalog entry, indexed by item ID.
///
/// Iteration is in sorted ID order so that anything derived from the
/// catalog is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<ItemId, CatalogEntry>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of entries, validating each one.
    pub fn from_entries(
        entries: impl IntoIterator<Item = CatalogEntry>,
    ) -> Result<Self, ConfigError> {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.register(entry)?;
        }
        Ok(catalog)
    }

    /// Register a catalog entry.
    pub fn register(&mut self, entry: CatalogEntry) -> Result<(), ConfigError> {
        entry.validate()?;
        if self.entries.contains_key(&entry.id) {
            return Err(ConfigError::DuplicateItem(entry.id.to_string()));
        }
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Get an entry by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    /// Check if an entry exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// All entries in ID order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Entries buildable by queues of the given category, in ID order.
    pub fn buildables_for<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.entries.values().filter(move |e| e.produced_in(category))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_catalog() -> Catalog {
        Catalog::from_entries([
            CatalogEntry::new("rifleman", 100, 60, "Infantry"),
            CatalogEntry::new("light_tank", 700, 420, "Vehicle"),
            CatalogEntry::new("harvester", 1400, 600, "Vehicle").with_queue("Starport"),
            CatalogEntry::new("barracks", 500, 300, "Building").structure(),
        ])
        .unwrap()
    }

    #[test]
    fn test_item_id_borrow_lookup() {
        let catalog = create_test_catalog();
        assert!(catalog.contains("rifleman"));
        assert!(catalog.get("light_tank").is_some());
        assert!(catalog.get("mammoth").is_none());
    }

    #[test]
    fn test_buildables_for_category() {
        let catalog = create_test_catalog();
        let vehicles: Vec<_> = catalog
            .buildables_for("Vehicle")
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(vehicles, vec!["harvester", "light_tank"]);

        let starport: Vec<_> = catalog
            .buildables_for("Starport")
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(starport, vec!["harvester"]);
    }

    #[test]
    fn test_base_build_time_falls_back_to_cost() {
        let entry = CatalogEntry::new("mcv", 2500, 900, "Vehicle").with_cost_derived_duration();
        assert_eq!(entry.base_build_time(), 2500);

        let entry = CatalogEntry::new("mcv", 2500, 900, "Vehicle");
        assert_eq!(entry.base_build_time(), 900);
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut catalog = create_test_catalog();
        let result = catalog.register(CatalogEntry::new("rifleman", 50, 30, "Infantry"));
        assert_eq!(
            result,
            Err(ConfigError::DuplicateItem("rifleman".to_string()))
        );
    }

    #[test]
    fn test_invalid_entries_rejected() {
        let zero_count = CatalogEntry::new("squad", 100, 60, "Infantry").with_count(0);
        assert_eq!(
            zero_count.validate(),
            Err(ConfigError::InvalidPerPurchaseCount("squad".to_string()))
        );

        let negative = CatalogEntry::new("refund_exploit", -10, 60, "Infantry");
        assert_eq!(
            negative.validate(),
            Err(ConfigError::NegativeCost("refund_exploit".to_string()))
        );
    }

    #[test]
    fn test_entry_from_ron() {
        let entry: CatalogEntry = ron::from_str(
            r#"CatalogEntry(
                id: "frigate",
                cost: 1200,
                count: 3,
                queues: ["Starport"],
            )"#,
        )
        .unwrap();

        assert_eq!(entry.id, ItemId::new("frigate"));
        assert_eq!(entry.count, 3);
        assert_eq!(entry.build_duration_modifier, 100);
        assert_eq!(entry.base_build_time(), 1200);
        assert!(!entry.is_structure);
    }
}
