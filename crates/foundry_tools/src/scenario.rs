//! Scenario definitions for headless production runs.
//!
//! A scenario bundles a ruleset, the players, their facilities and a
//! script of timed commands. Scenarios are loaded from RON files.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "Starport rush",
//!     ruleset: Ruleset(
//!         catalog: [CatalogEntry(id: "frigate", cost: 300, build_duration: Some(40), queues: ["Starport"])],
//!         queues: [QueueConfig(queue_type: "Starport", mode: ParallelBatched(BatchedConfig(starport_limit: 3)))],
//!     ),
//!     players: [PlayerSetup(id: 1, faction: "atreides", cash: 2000, tech: ["frigate"])],
//!     facilities: [FacilitySetup(id: 1, owner: 1, queue: "Starport")],
//!     commands: [
//!         TimedCommand(tick: 0, command: Order(
//!             facility: FacilityId(1),
//!             order: StartProduction(item: "frigate", count: 3),
//!         )),
//!     ],
//!     ticks: 200,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use foundry_core::prelude::*;

use crate::report::ScenarioReport;

/// Errors that can occur when loading or running scenarios.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario's ruleset or setup is invalid.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] FoundryError),
    /// A facility names a queue the ruleset does not define.
    #[error("Facility {facility} uses undefined queue '{queue}'")]
    UnknownQueue {
        /// Facility ID.
        facility: u64,
        /// Queue category.
        queue: String,
    },
}

/// Result type for scenario operations.
pub type Result<T> = std::result::Result<T, ScenarioError>;

/// A player taking part in the scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Player ID.
    pub id: u32,
    /// Faction name.
    pub faction: String,
    /// Starting cash.
    pub cash: i32,
    /// Items unlocked from the start.
    #[serde(default)]
    pub tech: Vec<ItemId>,
    /// Developer settings.
    #[serde(default)]
    pub developer: DeveloperMode,
}

/// A production facility and its queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitySetup {
    /// Facility ID.
    pub id: u64,
    /// Owning player ID.
    pub owner: u32,
    /// Queue category from the ruleset.
    pub queue: String,
    /// Producer slots. Empty means one producer for the queue's category.
    #[serde(default)]
    pub producers: Vec<ProducerSlot>,
}

/// A command applied at the start of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedCommand {
    /// Tick to apply the command at.
    pub tick: u64,
    /// The command.
    pub command: SimCommand,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Catalog and queue definitions.
    pub ruleset: Ruleset,
    /// Players.
    pub players: Vec<PlayerSetup>,
    /// Facilities, in step order.
    pub facilities: Vec<FacilitySetup>,
    /// Timed command script.
    #[serde(default)]
    pub commands: Vec<TimedCommand>,
    /// Ticks to simulate.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
}

const fn default_ticks() -> u64 {
    1000
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let scenario: Self = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Build the simulation with every command scheduled.
    pub fn build(&self) -> Result<Simulation> {
        let mut sim = Simulation::from_ruleset(&self.ruleset)?;

        for setup in &self.players {
            let player = sim.add_player(setup.id, setup.faction.clone(), setup.cash);
            if setup.developer != DeveloperMode::default() {
                sim.apply(SimCommand::SetDeveloper {
                    player,
                    developer: setup.developer,
                })?;
            }
        }

        for setup in &self.facilities {
            let config = self
                .ruleset
                .queue(&setup.queue)
                .ok_or_else(|| ScenarioError::UnknownQueue {
                    facility: setup.id,
                    queue: setup.queue.clone(),
                })?;
            let producers = if setup.producers.is_empty() {
                vec![ProducerSlot::new(1, setup.queue.clone())]
            } else {
                setup.producers.clone()
            };
            sim.add_queue(
                config.clone(),
                FacilityId(setup.id),
                PlayerId(setup.owner),
                producers,
            )?;
        }

        for setup in &self.players {
            for item in &setup.tech {
                sim.apply(SimCommand::Grant {
                    player: PlayerId(setup.id),
                    item: item.clone(),
                })?;
            }
        }

        for timed in &self.commands {
            sim.schedule(timed.tick, timed.command.clone());
        }

        tracing::debug!(
            scenario = %self.name,
            players = self.players.len(),
            facilities = self.facilities.len(),
            commands = self.commands.len(),
            "Scenario built"
        );
        Ok(sim)
    }

    /// Run the scenario and summarize the outcome.
    ///
    /// `ticks` overrides the scenario's own tick count.
    pub fn run(&self, ticks: Option<u64>) -> Result<ScenarioReport> {
        let mut sim = self.build()?;
        let ticks = ticks.unwrap_or(self.ticks);

        tracing::info!(scenario = %self.name, ticks, "Running scenario");
        let events = sim.run(ticks);

        Ok(ScenarioReport::collect(&self.name, &sim, &events))
    }
}
