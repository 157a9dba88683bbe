//! Per-item visibility and buildability cached by a queue.
//!
//! The queue never resolves prerequisites itself. An external tech tree
//! sends availability notifications and the queue records them here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ItemId};

/// Cached prerequisite state for one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionState {
    /// Shown on the build palette.
    pub visible: bool,
    /// Prerequisites are met.
    pub buildable: bool,
}

impl Default for ProductionState {
    fn default() -> Self {
        Self {
            visible: true,
            buildable: false,
        }
    }
}

/// The set of items a queue could ever produce, with their cached state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Producibles {
    states: BTreeMap<ItemId, ProductionState>,
}

impl Producibles {
    /// Build a fresh cache for every catalog entry of a category.
    ///
    /// Every entry starts visible and not buildable until the tech tree
    /// reports otherwise.
    #[must_use]
    pub fn for_category(catalog: &Catalog, category: &str) -> Self {
        let states = catalog
            .buildables_for(category)
            .map(|entry| (entry.id.clone(), ProductionState::default()))
            .collect();
        Self { states }
    }

    /// Drop every cached state.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Look up the state of an item.
    #[must_use]
    pub fn get(&self, item: &str) -> Option<ProductionState> {
        self.states.get(item).copied()
    }

    /// Check if the item is tracked by this cache.
    #[must_use]
    pub fn contains(&self, item: &str) -> bool {
        self.states.contains_key(item)
    }

    /// Set the buildable flag. Returns `false` for untracked items.
    pub fn set_buildable(&mut self, item: &str, buildable: bool) -> bool {
        match self.states.get_mut(item) {
            Some(state) => {
                state.buildable = buildable;
                true
            }
            None => false,
        }
    }

    /// Set the visible flag. Returns `false` for untracked items.
    pub fn set_visible(&mut self, item: &str, visible: bool) -> bool {
        match self.states.get_mut(item) {
            Some(state) => {
                state.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Every tracked item, in ID order.
    pub fn all(&self) -> impl Iterator<Item = &ItemId> {
        self.states.keys()
    }

    /// Items that are visible or buildable, in ID order.
    pub fn listed(&self) -> impl Iterator<Item = &ItemId> {
        self.states
            .iter()
            .filter(|(_, s)| s.visible || s.buildable)
            .map(|(id, _)| id)
    }

    /// Items whose prerequisites are met, in ID order.
    pub fn buildable(&self) -> impl Iterator<Item = &ItemId> {
        self.states
            .iter()
            .filter(|(_, s)| s.buildable)
            .map(|(id, _)| id)
    }

    /// Number of tracked items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn create_test_producibles() -> Producibles {
        let catalog = Catalog::from_entries([
            CatalogEntry::new("trike", 300, 100, "Vehicle"),
            CatalogEntry::new("quad", 400, 120, "Vehicle"),
            CatalogEntry::new("trooper", 100, 40, "Infantry"),
        ])
        .unwrap();
        Producibles::for_category(&catalog, "Vehicle")
    }

    #[test]
    fn test_cache_covers_category_only() {
        let producibles = create_test_producibles();
        assert_eq!(producibles.len(), 2);
        assert!(producibles.contains("trike"));
        assert!(!producibles.contains("trooper"));
    }

    #[test]
    fn test_default_state_visible_not_buildable() {
        let producibles = create_test_producibles();
        let state = producibles.get("quad").unwrap();
        assert!(state.visible);
        assert!(!state.buildable);
        assert_eq!(producibles.buildable().count(), 0);
        assert_eq!(producibles.listed().count(), 2);
    }

    #[test]
    fn test_notifications_update_state() {
        let mut producibles = create_test_producibles();

        assert!(producibles.set_buildable("trike", true));
        assert!(producibles.set_visible("quad", false));
        assert!(!producibles.set_buildable("trooper", true));

        let buildable: Vec<_> = producibles.buildable().map(ItemId::as_str).collect();
        assert_eq!(buildable, vec!["trike"]);
        let listed: Vec<_> = producibles.listed().map(ItemId::as_str).collect();
        assert_eq!(listed, vec!["trike"]);
    }
}
