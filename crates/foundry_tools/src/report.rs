//! Summaries of finished scenario runs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use foundry_core::prelude::*;

/// Final state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReport {
    /// Player ID.
    pub id: u32,
    /// Faction name.
    pub faction: String,
    /// Cash left.
    pub cash: i32,
    /// Net amount spent on production.
    pub spent: i64,
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Ticks simulated.
    pub ticks: u64,
    /// Final simulation state hash.
    pub final_hash: u64,
    /// Final state per player.
    pub players: Vec<PlayerReport>,
    /// Units delivered per item type.
    pub delivered: BTreeMap<String, u32>,
    /// Number of batch deliveries.
    pub batches: u32,
    /// Orders refused by admission control.
    pub rejected: u32,
    /// Items cancelled or dropped.
    pub cancelled: u32,
    /// Steps that stalled on funds.
    pub stalls: u32,
    /// Total refunded to players.
    pub refunded: i64,
    /// How often each cue played.
    pub cues: BTreeMap<String, u32>,
}

impl ScenarioReport {
    /// Summarize a finished simulation and the events it produced.
    #[must_use]
    pub fn collect(name: &str, sim: &Simulation, events: &[ProductionEvent]) -> Self {
        let mut report = Self {
            name: name.to_string(),
            ticks: sim.get_tick(),
            final_hash: sim.state_hash(),
            players: sim
                .players()
                .map(|p| PlayerReport {
                    id: p.id.0,
                    faction: p.faction.clone(),
                    cash: p.resources.cash,
                    spent: p.resources.spent,
                })
                .collect(),
            delivered: BTreeMap::new(),
            batches: 0,
            rejected: 0,
            cancelled: 0,
            stalls: 0,
            refunded: 0,
            cues: BTreeMap::new(),
        };

        for event in events {
            for (item, count) in event.delivered_units() {
                *report.delivered.entry(item.to_string()).or_insert(0) += count;
            }
            report.refunded += i64::from(event.refund());
            match event {
                ProductionEvent::BatchDelivered { .. } => report.batches += 1,
                ProductionEvent::Rejected { count, .. } => report.rejected += count,
                ProductionEvent::Cancelled { .. } | ProductionEvent::Dropped { .. } => {
                    report.cancelled += 1;
                }
                ProductionEvent::Stalled { .. } => report.stalls += 1,
                _ => {}
            }
        }

        for played in sim.cues() {
            *report.cues.entry(played.cue.clone()).or_insert(0) += 1;
        }

        report
    }

    /// Render the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario: {}", self.name)?;
        writeln!(f, "Ticks: {} (hash {:016x})", self.ticks, self.final_hash)?;
        writeln!(f, "Players:")?;
        for player in &self.players {
            writeln!(
                f,
                "  {} ({}): cash {}, spent {}",
                player.id, player.faction, player.cash, player.spent
            )?;
        }
        writeln!(f, "Delivered:")?;
        if self.delivered.is_empty() {
            writeln!(f, "  nothing")?;
        }
        for (item, count) in &self.delivered {
            writeln!(f, "  {item}: {count}")?;
        }
        writeln!(
            f,
            "Batches: {}, rejected: {}, cancelled: {}, stalls: {}, refunded: {}",
            self.batches, self.rejected, self.cancelled, self.stalls, self.refunded
        )?;
        if !self.cues.is_empty() {
            writeln!(f, "Cues:")?;
            for (cue, count) in &self.cues {
                writeln!(f, "  {cue}: {count}")?;
            }
        }
        Ok(())
    }
}
