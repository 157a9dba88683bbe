//! Test fixtures and helpers.
//!
//! Recording collaborators, a harness that lends them to a queue, and a
//! small standard catalog for consistent testing.

use std::collections::BTreeMap;
use std::sync::Arc;

use foundry_core::prelude::*;

/// One call to [`Producer::produce_one`] that succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedOne {
    /// Facility that delivered.
    pub facility: FacilityId,
    /// Producer slot used.
    pub producer: ProducerId,
    /// Item delivered.
    pub item: ItemId,
    /// Production category used.
    pub category: String,
    /// Units delivered.
    pub count: u32,
    /// Initial state handed over.
    pub init: ProductionInit,
}

/// Producer that records every hand-off.
///
/// Set `blocked` to refuse every hand-off, as if the exit were obstructed.
#[derive(Debug, Clone, Default)]
pub struct RecordingProducer {
    /// Refuse every hand-off while set.
    pub blocked: bool,
    /// Number of hand-off attempts, including refused ones.
    pub attempts: u32,
    /// Successful single deliveries.
    pub singles: Vec<ProducedOne>,
    /// Successful batch deliveries, one entry per unit.
    pub batches: Vec<Vec<ItemId>>,
}

impl RecordingProducer {
    /// Total units delivered through either path.
    #[must_use]
    pub fn units(&self) -> u32 {
        let singles: u32 = self.singles.iter().map(|p| p.count).sum();
        let batched = self.batches.iter().map(Vec::len).sum::<usize>();
        singles + u32::try_from(batched).unwrap_or(u32::MAX)
    }
}

impl Producer for RecordingProducer {
    fn produce_one(&mut self, request: &ProduceRequest<'_>) -> bool {
        self.attempts += 1;
        if self.blocked {
            return false;
        }
        self.singles.push(ProducedOne {
            facility: request.facility,
            producer: request.producer,
            item: request.item.clone(),
            category: request.category.to_string(),
            count: request.count,
            init: request.init.clone(),
        });
        true
    }

    fn produce_batch(&mut self, request: &BatchRequest<'_>) -> bool {
        self.attempts += 1;
        if self.blocked {
            return false;
        }
        self.batches.push(request.items.to_vec());
        true
    }
}

/// Notification sink that records `(cue, faction)` pairs.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    /// Every cue played, in order.
    pub cues: Vec<(String, String)>,
}

impl RecordingSink {
    /// Number of times a cue was played.
    #[must_use]
    pub fn count(&self, cue: &str) -> usize {
        self.cues.iter().filter(|(c, _)| c == cue).count()
    }

    /// Whether a cue was played at least once.
    #[must_use]
    pub fn played(&self, cue: &str) -> bool {
        self.count(cue) > 0
    }

    /// Names of every cue played, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.cues.iter().map(|(c, _)| c.as_str()).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn play_cue(&mut self, cue: &str, faction: &str) {
        self.cues.push((cue.to_string(), faction.to_string()));
    }
}

/// Fixed owned-actor counts.
#[derive(Debug, Clone, Default)]
pub struct OwnedMap {
    counts: BTreeMap<(PlayerId, ItemId), u32>,
}

impl OwnedMap {
    /// Set how many of an item a player owns.
    pub fn set(&mut self, player: PlayerId, item: &str, count: u32) {
        self.counts.insert((player, ItemId::new(item)), count);
    }
}

impl OwnedActors for OwnedMap {
    fn owned_count(&self, player: PlayerId, item: &ItemId) -> u32 {
        self.counts
            .get(&(player, item.clone()))
            .copied()
            .unwrap_or(0)
    }
}

/// Every collaborator a queue needs, owned in one place.
#[derive(Debug, Clone)]
pub struct Harness {
    /// The owner's resource pool.
    pub resources: PlayerResources,
    /// The owner's power state.
    pub power: PowerState,
    /// Recording producer.
    pub producer: RecordingProducer,
    /// Recording notification sink.
    pub sink: RecordingSink,
    /// Owned-actor counts.
    pub owned: OwnedMap,
}

impl Harness {
    /// Create a harness whose owner starts with `cash`.
    #[must_use]
    pub fn with_cash(cash: i32) -> Self {
        Self {
            resources: PlayerResources::new(cash),
            power: PowerState::Normal,
            producer: RecordingProducer::default(),
            sink: RecordingSink::default(),
            owned: OwnedMap::default(),
        }
    }

    /// Borrow the collaborators for one queue operation.
    pub fn ctx(&mut self) -> Collaborators<'_> {
        Collaborators {
            resources: &mut self.resources,
            power: self.power,
            producer: &mut self.producer,
            notifications: &mut self.sink,
            owned: &self.owned,
        }
    }

    /// Queue `count` orders of an item.
    pub fn order(
        &mut self,
        queue: &mut ProductionQueue,
        item: &str,
        count: u32,
    ) -> std::result::Result<u32, AdmissionError> {
        queue.start_production(item, count, &mut self.ctx())
    }

    /// Step a queue once.
    pub fn tick(&mut self, queue: &mut ProductionQueue) -> Vec<ProductionEvent> {
        queue.tick(&mut self.ctx())
    }

    /// Step a queue several times, collecting every event.
    pub fn run(&mut self, queue: &mut ProductionQueue, ticks: u32) -> Vec<ProductionEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(self.tick(queue));
        }
        events
    }
}

/// Player used by every fixture queue.
pub const TEST_PLAYER: PlayerId = PlayerId(1);

/// Faction used by every fixture queue.
pub const TEST_FACTION: &str = "atreides";

/// A small catalog spanning a vehicle queue and a starport queue.
///
/// | item      | cost | time | queue    | notes                  |
/// |-----------|------|------|----------|------------------------|
/// | `trike`   | 100  | 10   | Vehicle  |                        |
/// | `raider`  | 97   | 10   | Vehicle  |                        |
/// | `harvester` | 30 | 100  | Vehicle  | build limit 2          |
/// | `frigate` | 300  | 4    | Starport |                        |
/// | `tank`    | 120  | 6    | Starport |                        |
/// | `squad`   | 300  | 9    | Starport | three units per order  |
#[must_use]
pub fn standard_catalog() -> Arc<Catalog> {
    let entries = [
        CatalogEntry::new("trike", 100, 10, "Vehicle"),
        CatalogEntry::new("raider", 97, 10, "Vehicle"),
        CatalogEntry::new("harvester", 30, 100, "Vehicle").with_build_limit(2),
        CatalogEntry::new("frigate", 300, 4, "Starport"),
        CatalogEntry::new("tank", 120, 6, "Starport"),
        CatalogEntry::new("squad", 300, 9, "Starport").with_count(3),
    ];
    match Catalog::from_entries(entries) {
        Ok(catalog) => Arc::new(catalog),
        Err(err) => panic!("standard catalog is invalid: {err}"),
    }
}

/// Cues with a distinct name for every event, so tests can tell them apart.
#[must_use]
pub fn test_cues() -> QueueCues {
    QueueCues {
        ready: Some("Ready".to_string()),
        blocked: Some("Blocked".to_string()),
        limited: Some("Limited".to_string()),
        queued: Some("Queued".to_string()),
        on_hold: Some("OnHold".to_string()),
        cancelled: Some("Cancelled".to_string()),
    }
}

/// Build a queue over the standard catalog with every item unlocked.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn unlocked_queue(config: QueueConfig, producers: Vec<ProducerSlot>) -> ProductionQueue {
    let catalog = standard_catalog();
    let mut queue = match ProductionQueue::new(
        config,
        Arc::clone(&catalog),
        FacilityId(1),
        Owner::new(TEST_PLAYER.0, TEST_FACTION),
        producers,
    ) {
        Ok(queue) => queue,
        Err(err) => panic!("invalid fixture queue: {err}"),
    };
    for entry in catalog.entries() {
        if queue.production_state(entry.id.as_str()).is_some() {
            queue.prerequisites_available(entry.id.as_str());
        }
    }
    queue
}

/// A sequential vehicle queue with one producer and every item unlocked.
#[must_use]
pub fn vehicle_queue() -> ProductionQueue {
    unlocked_queue(
        QueueConfig::new("Vehicle").with_cues(test_cues()),
        vec![ProducerSlot::new(1, "Vehicle")],
    )
}

/// A batched starport queue with one producer and every item unlocked.
#[must_use]
pub fn starport_queue(batched: BatchedConfig) -> ProductionQueue {
    unlocked_queue(
        QueueConfig::new("Starport")
            .with_cues(test_cues())
            .batched(batched),
        vec![ProducerSlot::new(1, "Starport")],
    )
}

/// Every delivered unit in a list of events, flattened.
#[must_use]
pub fn delivered(events: &[ProductionEvent]) -> Vec<ItemId> {
    let mut units = Vec::new();
    for event in events {
        for (item, count) in event.delivered_units() {
            for _ in 0..count {
                units.push(item.clone());
            }
        }
    }
    units
}
