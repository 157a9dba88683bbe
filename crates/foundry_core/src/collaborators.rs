//! Interfaces to everything the scheduler does not own.
//!
//! Spawning, notification playback and the count of already-owned actors
//! live outside this crate. A queue is handed these collaborators explicitly
//! for every operation that needs them, bundled in [`Collaborators`].

use serde::{Deserialize, Serialize};

use crate::catalog::ItemId;
use crate::economy::{PowerState, ResourcePool};

/// Identifier of the facility (building) a queue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FacilityId(pub u64);

/// Identifier of a producer slot within a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProducerId(pub u32);

/// Identifier of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// A producer attached to a facility, as seen by its queue.
///
/// The queue is constructed with its slots; the slots only describe which
/// categories a producer accepts and whether it is currently usable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProducerSlot {
    /// Slot identifier.
    pub id: ProducerId,
    /// Production categories this producer accepts.
    pub produces: Vec<String>,
    /// Disabled producers cannot produce and do not keep the queue enabled.
    #[serde(default)]
    pub disabled: bool,
    /// Paused producers hold deliveries and stop item progress.
    #[serde(default)]
    pub paused: bool,
}

impl ProducerSlot {
    /// Create an enabled, unpaused producer for one category.
    #[must_use]
    pub fn new(id: u32, category: impl Into<String>) -> Self {
        Self {
            id: ProducerId(id),
            produces: vec![category.into()],
            disabled: false,
            paused: false,
        }
    }

    /// Check if this producer accepts a category.
    #[must_use]
    pub fn produces(&self, category: &str) -> bool {
        self.produces.iter().any(|p| p == category)
    }
}

/// Initial state handed to the producer for each produced item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionInit {
    /// Owning player.
    pub owner: PlayerId,
    /// Faction the item starts with.
    pub faction: String,
}

/// A single finished order.
#[derive(Debug, Clone, Copy)]
pub struct ProduceRequest<'a> {
    /// Facility that finished the order.
    pub facility: FacilityId,
    /// Producer slot chosen for the hand-off.
    pub producer: ProducerId,
    /// Item to produce.
    pub item: &'a ItemId,
    /// Production category.
    pub category: &'a str,
    /// Units to produce.
    pub count: u32,
    /// Initial state for the produced units.
    pub init: &'a ProductionInit,
}

/// A batch of finished orders delivered together.
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    /// Facility that finished the batch.
    pub facility: FacilityId,
    /// Producer slot chosen for the hand-off.
    pub producer: ProducerId,
    /// One entry per unit to produce.
    pub items: &'a [ItemId],
    /// Production category.
    pub category: &'a str,
    /// Initial state per unit, parallel to `items`.
    pub inits: &'a [ProductionInit],
}

/// Turns finished requests into units in the world.
pub trait Producer {
    /// Produce one finished order. Returns `false` when the hand-off could
    /// not happen this step (for example the exit is blocked).
    fn produce_one(&mut self, request: &ProduceRequest<'_>) -> bool;

    /// Produce a whole batch atomically. Returns `false` if nothing was
    /// produced.
    fn produce_batch(&mut self, request: &BatchRequest<'_>) -> bool;
}

/// Outbound notification playback. Fire and forget.
pub trait NotificationSink {
    /// Play a named cue for a faction.
    fn play_cue(&mut self, cue: &str, faction: &str);
}

/// Count of actors a player already owns, for build limits.
pub trait OwnedActors {
    /// Number of `item` actors owned by `player`.
    fn owned_count(&self, player: PlayerId, item: &ItemId) -> u32;
}

/// Owned-actor lookup for worlds without build limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOwnedActors;

impl OwnedActors for NoOwnedActors {
    fn owned_count(&self, _player: PlayerId, _item: &ItemId) -> u32 {
        0
    }
}

/// Everything a queue needs from the outside world for one operation.
pub struct Collaborators<'a> {
    /// The owner's resource pool.
    pub resources: &'a mut dyn ResourcePool,
    /// The owner's current power state.
    pub power: PowerState,
    /// Spawner for finished items.
    pub producer: &'a mut dyn Producer,
    /// Notification playback.
    pub notifications: &'a mut dyn NotificationSink,
    /// Already-owned actor counts.
    pub owned: &'a dyn OwnedActors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_slot_categories() {
        let mut slot = ProducerSlot::new(1, "Vehicle");
        assert!(slot.produces("Vehicle"));
        assert!(!slot.produces("Infantry"));

        slot.produces.push("Infantry".to_string());
        assert!(slot.produces("Infantry"));
    }

    #[test]
    fn test_no_owned_actors() {
        let owned = NoOwnedActors;
        assert_eq!(owned.owned_count(PlayerId(1), &ItemId::new("trike")), 0);
    }
}
