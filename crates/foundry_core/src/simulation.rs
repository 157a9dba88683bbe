//! Fixed-step driver for many production queues.
//!
//! The simulation owns the players (resource pool, power state, developer
//! settings and unlocked tech), every facility's queue and simple in-memory
//! collaborators that record what was produced and which cues were played.
//!
//! # Determinism
//!
//! - Queues are stepped in insertion order, exactly once per tick.
//! - Players and owned counts live in `BTreeMap`s.
//! - Scheduled commands for a tick are applied in the order they were added,
//!   before any queue steps.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use foundry_core::prelude::*;
//! use foundry_core::simulation::SimCommand;
//!
//! let catalog = Catalog::from_entries([CatalogEntry::new("trike", 100, 10, "Vehicle")]).unwrap();
//! let mut sim = Simulation::new(Arc::new(catalog));
//! let player = sim.add_player(1, "atreides", 1000);
//! sim.add_queue(
//!     QueueConfig::new("Vehicle"),
//!     FacilityId(1),
//!     player,
//!     vec![ProducerSlot::new(1, "Vehicle")],
//! )
//! .unwrap();
//!
//! sim.apply(SimCommand::Grant { player, item: ItemId::new("trike") }).unwrap();
//! sim.apply(SimCommand::Order {
//!     facility: FacilityId(1),
//!     order: ProductionOrder::StartProduction { item: ItemId::new("trike"), count: 1 },
//! })
//! .unwrap();
//!
//! sim.run(11);
//! assert_eq!(sim.owned_count(player, &ItemId::new("trike")), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ItemId};
use crate::collaborators::{
    BatchRequest, Collaborators, FacilityId, NotificationSink, OwnedActors, PlayerId,
    ProduceRequest, Producer, ProducerId, ProducerSlot,
};
use crate::config::{QueueConfig, Ruleset};
use crate::economy::{PlayerResources, PowerState};
use crate::error::{FoundryError, Result};
use crate::events::ProductionEvent;
use crate::queue::{DeveloperMode, Owner, ProductionOrder, ProductionQueue};

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 25;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u32 = 1000 / TICK_RATE;

/// Everything the simulation tracks about one player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player identifier.
    pub id: PlayerId,
    /// Faction name.
    pub faction: String,
    /// Cash stockpile.
    pub resources: PlayerResources,
    /// Power grid state.
    pub power: PowerState,
    /// Developer settings.
    pub developer: DeveloperMode,
    /// Items whose prerequisites the player has met.
    pub tech: BTreeSet<ItemId>,
}

impl PlayerState {
    fn as_owner(&self) -> Owner {
        Owner {
            player: self.id,
            faction: self.faction.clone(),
            developer: self.developer,
        }
    }
}

/// External inputs to the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimCommand {
    /// A production order for a facility.
    Order {
        /// Target facility.
        facility: FacilityId,
        /// The order.
        order: ProductionOrder,
    },
    /// A player met the prerequisites for an item.
    Grant {
        /// Player.
        player: PlayerId,
        /// Item unlocked.
        item: ItemId,
    },
    /// A player lost the prerequisites for an item.
    Revoke {
        /// Player.
        player: PlayerId,
        /// Item locked.
        item: ItemId,
    },
    /// Add cash to a player's stockpile.
    Deposit {
        /// Player.
        player: PlayerId,
        /// Amount added.
        amount: i32,
    },
    /// Change a player's power state.
    SetPower {
        /// Player.
        player: PlayerId,
        /// New power state.
        power: PowerState,
    },
    /// Change a player's developer settings.
    SetDeveloper {
        /// Player.
        player: PlayerId,
        /// New settings.
        developer: DeveloperMode,
    },
    /// Hand a facility to another player.
    Transfer {
        /// Facility.
        facility: FacilityId,
        /// New owner.
        to: PlayerId,
    },
    /// A facility was destroyed.
    FacilityLost {
        /// Facility.
        facility: FacilityId,
    },
    /// Block or unblock a facility's exit.
    SetExitBlocked {
        /// Facility.
        facility: FacilityId,
        /// Whether the exit is blocked.
        blocked: bool,
    },
    /// Pause or resume one producer of a facility.
    SetProducerPaused {
        /// Facility.
        facility: FacilityId,
        /// Producer slot.
        producer: ProducerId,
        /// New pause flag.
        paused: bool,
    },
    /// Enable or disable one producer of a facility.
    SetProducerDisabled {
        /// Facility.
        facility: FacilityId,
        /// Producer slot.
        producer: ProducerId,
        /// New disabled flag.
        disabled: bool,
    },
}

/// A unit that left a facility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spawned {
    /// Tick the unit was produced.
    pub tick: u64,
    /// Facility that produced it.
    pub facility: FacilityId,
    /// Owner of the new unit.
    pub owner: PlayerId,
    /// Faction of the new unit.
    pub faction: String,
    /// Unit type.
    pub item: ItemId,
    /// Production category used.
    pub category: String,
}

/// Producer that records every unit it produces.
///
/// Facilities whose exit is blocked refuse every hand-off.
#[derive(Debug, Clone, Default)]
pub struct SpawnLedger {
    tick: u64,
    spawned: Vec<Spawned>,
    blocked: BTreeSet<FacilityId>,
}

impl SpawnLedger {
    /// Every unit produced so far, in production order.
    #[must_use]
    pub fn spawned(&self) -> &[Spawned] {
        &self.spawned
    }

    /// Block or unblock a facility's exit.
    pub fn set_blocked(&mut self, facility: FacilityId, blocked: bool) {
        if blocked {
            self.blocked.insert(facility);
        } else {
            self.blocked.remove(&facility);
        }
    }
}

impl Producer for SpawnLedger {
    fn produce_one(&mut self, request: &ProduceRequest<'_>) -> bool {
        if self.blocked.contains(&request.facility) {
            return false;
        }
        for _ in 0..request.count {
            self.spawned.push(Spawned {
                tick: self.tick,
                facility: request.facility,
                owner: request.init.owner,
                faction: request.init.faction.clone(),
                item: request.item.clone(),
                category: request.category.to_string(),
            });
        }
        true
    }

    fn produce_batch(&mut self, request: &BatchRequest<'_>) -> bool {
        if self.blocked.contains(&request.facility) {
            return false;
        }
        for (item, init) in request.items.iter().zip(request.inits) {
            self.spawned.push(Spawned {
                tick: self.tick,
                facility: request.facility,
                owner: init.owner,
                faction: init.faction.clone(),
                item: item.clone(),
                category: request.category.to_string(),
            });
        }
        true
    }
}

/// A cue played during the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayedCue {
    /// Tick the cue was played.
    pub tick: u64,
    /// Cue name.
    pub cue: String,
    /// Faction it was played for.
    pub faction: String,
}

/// Notification sink that records every cue.
#[derive(Debug, Clone, Default)]
pub struct CueLog {
    tick: u64,
    played: Vec<PlayedCue>,
}

impl CueLog {
    /// Every cue played so far.
    #[must_use]
    pub fn played(&self) -> &[PlayedCue] {
        &self.played
    }
}

impl NotificationSink for CueLog {
    fn play_cue(&mut self, cue: &str, faction: &str) {
        self.played.push(PlayedCue {
            tick: self.tick,
            cue: cue.to_string(),
            faction: faction.to_string(),
        });
    }
}

/// Owned unit counts per player, used for build limits.
#[derive(Debug, Clone, Default, Hash)]
pub struct OwnedLedger {
    counts: BTreeMap<(PlayerId, ItemId), u32>,
}

impl OwnedLedger {
    /// Record newly owned units.
    pub fn credit(&mut self, player: PlayerId, item: &ItemId, count: u32) {
        let entry = self.counts.entry((player, item.clone())).or_insert(0);
        *entry = entry.saturating_add(count);
    }
}

impl OwnedActors for OwnedLedger {
    fn owned_count(&self, player: PlayerId, item: &ItemId) -> u32 {
        self.counts
            .get(&(player, item.clone()))
            .copied()
            .unwrap_or(0)
    }
}

/// The production simulation.
#[derive(Debug, Clone)]
pub struct Simulation {
    tick: u64,
    catalog: Arc<Catalog>,
    players: BTreeMap<PlayerId, PlayerState>,
    queues: Vec<ProductionQueue>,
    scheduled: BTreeMap<u64, Vec<SimCommand>>,
    owned: OwnedLedger,
    producer: SpawnLedger,
    cues: CueLog,
}

impl Simulation {
    /// Create an empty simulation over a catalog.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            tick: 0,
            catalog,
            players: BTreeMap::new(),
            queues: Vec::new(),
            scheduled: BTreeMap::new(),
            owned: OwnedLedger::default(),
            producer: SpawnLedger::default(),
            cues: CueLog::default(),
        }
    }

    /// Create an empty simulation over a ruleset's catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the ruleset fails validation.
    pub fn from_ruleset(ruleset: &Ruleset) -> Result<Self> {
        ruleset.validate()?;
        Ok(Self::new(Arc::new(ruleset.build_catalog()?)))
    }

    /// The shared catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Add a player with starting cash.
    pub fn add_player(&mut self, id: u32, faction: impl Into<String>, cash: i32) -> PlayerId {
        let id = PlayerId(id);
        self.players.insert(
            id,
            PlayerState {
                id,
                faction: faction.into(),
                resources: PlayerResources::new(cash),
                power: PowerState::Normal,
                developer: DeveloperMode::default(),
                tech: BTreeSet::new(),
            },
        );
        id
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    /// Every player, in ID order.
    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    /// Add a facility's queue owned by `owner`.
    ///
    /// The queue starts with the owner's unlocked tech.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner is unknown, the facility already has a
    /// queue, or the configuration is invalid.
    pub fn add_queue(
        &mut self,
        config: QueueConfig,
        facility: FacilityId,
        owner: PlayerId,
        producers: Vec<ProducerSlot>,
    ) -> Result<()> {
        if self.queues.iter().any(|q| q.facility() == facility) {
            return Err(FoundryError::InvalidState(format!(
                "facility {} already has a queue",
                facility.0
            )));
        }
        let player = self.player_state(owner)?;
        let mut queue = ProductionQueue::new(
            config,
            Arc::clone(&self.catalog),
            facility,
            player.as_owner(),
            producers,
        )?;
        apply_tech(&mut queue, &player.tech);
        self.queues.push(queue);
        Ok(())
    }

    /// Look up a facility's queue.
    #[must_use]
    pub fn queue(&self, facility: FacilityId) -> Option<&ProductionQueue> {
        self.queues.iter().find(|q| q.facility() == facility)
    }

    /// Every queue, in step order.
    #[must_use]
    pub fn queues(&self) -> &[ProductionQueue] {
        &self.queues
    }

    /// Every unit produced so far.
    #[must_use]
    pub fn spawned(&self) -> &[Spawned] {
        self.producer.spawned()
    }

    /// Every cue played so far.
    #[must_use]
    pub fn cues(&self) -> &[PlayedCue] {
        self.cues.played()
    }

    /// Number of `item` units a player owns.
    #[must_use]
    pub fn owned_count(&self, player: PlayerId, item: &ItemId) -> u32 {
        self.owned.owned_count(player, item)
    }

    /// Apply a command at the start of a future tick.
    pub fn schedule(&mut self, tick: u64, command: SimCommand) {
        self.scheduled.entry(tick).or_default().push(command);
    }

    fn player_state(&self, id: PlayerId) -> Result<&PlayerState> {
        self.players
            .get(&id)
            .ok_or_else(|| FoundryError::InvalidState(format!("unknown player {}", id.0)))
    }

    fn player_state_mut(&mut self, id: PlayerId) -> Result<&mut PlayerState> {
        self.players
            .get_mut(&id)
            .ok_or_else(|| FoundryError::InvalidState(format!("unknown player {}", id.0)))
    }

    fn queue_index(&self, facility: FacilityId) -> Result<usize> {
        self.queues
            .iter()
            .position(|q| q.facility() == facility)
            .ok_or_else(|| FoundryError::InvalidState(format!("unknown facility {}", facility.0)))
    }

    /// Apply a command immediately.
    ///
    /// Refused production orders are not errors; they show up as
    /// [`ProductionEvent::Rejected`] on the next tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the command names an unknown player or facility.
    pub fn apply(&mut self, command: SimCommand) -> Result<()> {
        match command {
            SimCommand::Order { facility, order } => {
                let index = self.queue_index(facility)?;
                let queue = &mut self.queues[index];
                let player = self
                    .players
                    .get_mut(&queue.owner().player)
                    .ok_or_else(|| FoundryError::InvalidState("queue owner missing".to_string()))?;
                let mut ctx = Collaborators {
                    resources: &mut player.resources,
                    power: player.power,
                    producer: &mut self.producer,
                    notifications: &mut self.cues,
                    owned: &self.owned,
                };
                if let Err(reason) = queue.resolve_order(&order, &mut ctx) {
                    tracing::debug!(facility = facility.0, %reason, "Order refused");
                }
            }
            SimCommand::Grant { player, item } => {
                self.player_state_mut(player)?.tech.insert(item.clone());
                for queue in self.queues.iter_mut().filter(|q| q.owner().player == player) {
                    if queue.production_state(item.as_str()).is_some() {
                        queue.prerequisites_available(item.as_str());
                    }
                }
            }
            SimCommand::Revoke { player, item } => {
                self.player_state_mut(player)?.tech.remove(&item);
                for queue in self.queues.iter_mut().filter(|q| q.owner().player == player) {
                    if queue.production_state(item.as_str()).is_some() {
                        queue.prerequisites_unavailable(item.as_str());
                    }
                }
            }
            SimCommand::Deposit { player, amount } => {
                self.player_state_mut(player)?.resources.deposit(amount);
            }
            SimCommand::SetPower { player, power } => {
                self.player_state_mut(player)?.power = power;
            }
            SimCommand::SetDeveloper { player, developer } => {
                let state = self.player_state_mut(player)?;
                state.developer = developer;
                let owner = state.as_owner();
                for queue in self.queues.iter_mut().filter(|q| q.owner().player == player) {
                    queue.owner = owner.clone();
                }
            }
            SimCommand::Transfer { facility, to } => {
                let index = self.queue_index(facility)?;
                let new_owner = self.player_state(to)?;
                let owner = new_owner.as_owner();
                let tech = new_owner.tech.clone();

                let queue = &mut self.queues[index];
                let previous = queue.owner().player;
                let old = self
                    .players
                    .get_mut(&previous)
                    .ok_or_else(|| FoundryError::InvalidState("queue owner missing".to_string()))?;
                queue.transfer_ownership(owner, &mut old.resources);
                apply_tech(queue, &tech);
            }
            SimCommand::FacilityLost { facility } => {
                let index = self.queue_index(facility)?;
                let queue = &mut self.queues[index];
                let player = self
                    .players
                    .get_mut(&queue.owner().player)
                    .ok_or_else(|| FoundryError::InvalidState("queue owner missing".to_string()))?;
                queue.facility_lost(&mut player.resources);
            }
            SimCommand::SetExitBlocked { facility, blocked } => {
                self.queue_index(facility)?;
                self.producer.set_blocked(facility, blocked);
            }
            SimCommand::SetProducerPaused {
                facility,
                producer,
                paused,
            } => {
                let index = self.queue_index(facility)?;
                if !self.queues[index].set_producer_paused(producer, paused) {
                    return Err(FoundryError::InvalidState(format!(
                        "facility {} has no producer {}",
                        facility.0, producer.0
                    )));
                }
            }
            SimCommand::SetProducerDisabled {
                facility,
                producer,
                disabled,
            } => {
                let index = self.queue_index(facility)?;
                if !self.queues[index].set_producer_disabled(producer, disabled) {
                    return Err(FoundryError::InvalidState(format!(
                        "facility {} has no producer {}",
                        facility.0, producer.0
                    )));
                }
            }
        }
        Ok(())
    }

    /// Advance the simulation by one tick.
    ///
    /// Applies the commands scheduled for this tick, steps every queue once
    /// in order, and credits delivered units to their owners.
    pub fn tick(&mut self) -> Vec<ProductionEvent> {
        if let Some(commands) = self.scheduled.remove(&self.tick) {
            for command in commands {
                if let Err(err) = self.apply(command) {
                    tracing::warn!(tick = self.tick, %err, "Scheduled command failed");
                }
            }
        }

        self.producer.tick = self.tick;
        self.cues.tick = self.tick;

        let mut events = Vec::new();
        for queue in &mut self.queues {
            let owner = queue.owner().player;
            let Some(player) = self.players.get_mut(&owner) else {
                continue;
            };
            let mut ctx = Collaborators {
                resources: &mut player.resources,
                power: player.power,
                producer: &mut self.producer,
                notifications: &mut self.cues,
                owned: &self.owned,
            };
            let produced = queue.tick(&mut ctx);

            for event in &produced {
                for (item, count) in event.delivered_units() {
                    self.owned.credit(owner, item, count);
                }
            }
            events.extend(produced);
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    /// Advance the simulation by several ticks, collecting every event.
    pub fn run(&mut self, ticks: u64) -> Vec<ProductionEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(self.tick());
        }
        events
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations that received the same inputs hash identically.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        for player in self.players.values() {
            player.hash(&mut hasher);
        }
        for queue in &self.queues {
            queue.state_hash().hash(&mut hasher);
        }
        self.owned.hash(&mut hasher);
        self.producer.spawned.hash(&mut hasher);
        self.cues.played.hash(&mut hasher);
        hasher.finish()
    }
}

fn apply_tech(queue: &mut ProductionQueue, tech: &BTreeSet<ItemId>) {
    for item in tech {
        if queue.production_state(item.as_str()).is_some() {
            queue.prerequisites_available(item.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::config::BatchedConfig;

    fn create_test_sim() -> (Simulation, PlayerId, PlayerId) {
        let catalog = Catalog::from_entries([
            CatalogEntry::new("trike", 100, 10, "Vehicle"),
            CatalogEntry::new("quad", 200, 5, "Vehicle").with_build_limit(1),
            CatalogEntry::new("frigate", 300, 4, "Starport"),
        ])
        .unwrap();
        let mut sim = Simulation::new(Arc::new(catalog));
        let atreides = sim.add_player(1, "atreides", 1000);
        let harkonnen = sim.add_player(2, "harkonnen", 1000);
        sim.add_queue(
            QueueConfig::new("Vehicle"),
            FacilityId(10),
            atreides,
            vec![ProducerSlot::new(1, "Vehicle")],
        )
        .unwrap();
        (sim, atreides, harkonnen)
    }

    fn order(facility: u64, item: &str, count: u32) -> SimCommand {
        SimCommand::Order {
            facility: FacilityId(facility),
            order: ProductionOrder::StartProduction {
                item: ItemId::new(item),
                count,
            },
        }
    }

    #[test]
    fn test_scheduled_orders_and_delivery() {
        let (mut sim, atreides, _) = create_test_sim();
        sim.schedule(
            0,
            SimCommand::Grant {
                player: atreides,
                item: ItemId::new("trike"),
            },
        );
        sim.schedule(2, order(10, "trike", 2));

        sim.run(2);
        assert!(sim.queue(FacilityId(10)).unwrap().all_queued().is_empty());

        sim.run(22);
        assert_eq!(sim.owned_count(atreides, &ItemId::new("trike")), 2);
        assert_eq!(sim.spawned().len(), 2);
        assert_eq!(sim.spawned()[0].tick, 12);
        assert_eq!(sim.player(atreides).unwrap().resources.cash, 800);
    }

    #[test]
    fn test_owned_units_count_toward_build_limit() {
        let (mut sim, atreides, _) = create_test_sim();
        sim.apply(SimCommand::Grant {
            player: atreides,
            item: ItemId::new("quad"),
        })
        .unwrap();
        sim.apply(order(10, "quad", 1)).unwrap();
        sim.run(6);
        assert_eq!(sim.owned_count(atreides, &ItemId::new("quad")), 1);

        sim.apply(order(10, "quad", 1)).unwrap();
        assert!(sim.queue(FacilityId(10)).unwrap().all_queued().is_empty());
    }

    #[test]
    fn test_transfer_refunds_and_applies_new_tech() {
        let (mut sim, atreides, harkonnen) = create_test_sim();
        sim.apply(SimCommand::Grant {
            player: atreides,
            item: ItemId::new("trike"),
        })
        .unwrap();
        sim.apply(SimCommand::Grant {
            player: harkonnen,
            item: ItemId::new("quad"),
        })
        .unwrap();
        sim.apply(order(10, "trike", 1)).unwrap();
        sim.run(4);
        assert_eq!(sim.player(atreides).unwrap().resources.cash, 960);

        sim.apply(SimCommand::Transfer {
            facility: FacilityId(10),
            to: harkonnen,
        })
        .unwrap();
        assert_eq!(sim.player(atreides).unwrap().resources.cash, 1000);

        let queue = sim.queue(FacilityId(10)).unwrap();
        assert_eq!(queue.owner().player, harkonnen);
        assert!(queue.can_build("quad"));
        assert!(!queue.can_build("trike"));
    }

    #[test]
    fn test_blocked_exit_and_batched_queue() {
        let (mut sim, atreides, _) = create_test_sim();
        sim.add_queue(
            QueueConfig::new("Starport").batched(BatchedConfig {
                starport_limit: 2,
                ..BatchedConfig::default()
            }),
            FacilityId(20),
            atreides,
            vec![ProducerSlot::new(1, "Starport")],
        )
        .unwrap();
        sim.apply(SimCommand::Grant {
            player: atreides,
            item: ItemId::new("frigate"),
        })
        .unwrap();
        sim.apply(SimCommand::SetExitBlocked {
            facility: FacilityId(20),
            blocked: true,
        })
        .unwrap();
        sim.apply(order(20, "frigate", 2)).unwrap();

        sim.run(10);
        assert!(sim.spawned().is_empty());
        assert_eq!(sim.queue(FacilityId(20)).unwrap().pending_delivery().len(), 2);

        sim.apply(SimCommand::SetExitBlocked {
            facility: FacilityId(20),
            blocked: false,
        })
        .unwrap();
        let events = sim.tick();
        assert!(events
            .iter()
            .any(|e| matches!(e, ProductionEvent::BatchDelivered { items, .. } if items.len() == 2)));
        assert_eq!(sim.owned_count(atreides, &ItemId::new("frigate")), 2);
    }

    #[test]
    fn test_unknown_targets_are_errors() {
        let (mut sim, _, _) = create_test_sim();
        assert!(sim.apply(order(99, "trike", 1)).is_err());
        assert!(sim
            .apply(SimCommand::Deposit {
                player: PlayerId(42),
                amount: 10,
            })
            .is_err());
        assert!(sim
            .add_queue(
                QueueConfig::new("Vehicle"),
                FacilityId(10),
                PlayerId(1),
                Vec::new(),
            )
            .is_err());
    }

    #[test]
    fn test_identical_inputs_hash_identically() {
        let build = || {
            let (mut sim, atreides, _) = create_test_sim();
            sim.schedule(
                0,
                SimCommand::Grant {
                    player: atreides,
                    item: ItemId::new("trike"),
                },
            );
            sim.schedule(1, order(10, "trike", 3));
            sim.schedule(
                8,
                SimCommand::SetPower {
                    player: atreides,
                    power: PowerState::Degraded,
                },
            );
            sim.run(40);
            sim.state_hash()
        };
        assert_eq!(build(), build());
    }
}
