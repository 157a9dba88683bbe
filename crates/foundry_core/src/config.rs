//! Queue configuration and ruleset loading.
//!
//! All structs deserialize from RON with defaults matching the stock
//! ruleset. A [`Ruleset`] is validated as a whole when it is loaded, so an
//! invalid slowdown factor or a mismatched countdown table is rejected
//! before any queue exists.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::{ConfigError, FoundryError, Result};

/// Notification cue names played by a queue.
///
/// `None` disables a cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueCues {
    /// Played when an item is handed to the producer.
    pub ready: Option<String>,
    /// Played when an order cannot be queued, or a finished item cannot leave.
    pub blocked: Option<String>,
    /// Played when a queue or item limit cuts an order short.
    pub limited: Option<String>,
    /// Played on successful admission.
    pub queued: Option<String>,
    /// Played when production is put on hold.
    pub on_hold: Option<String>,
    /// Played when production is cancelled.
    pub cancelled: Option<String>,
}

impl Default for QueueCues {
    fn default() -> Self {
        Self {
            ready: Some("UnitReady".to_string()),
            blocked: Some("NoBuild".to_string()),
            limited: None,
            queued: Some("Training".to_string()),
            on_hold: Some("OnHold".to_string()),
            cancelled: Some("Cancelled".to_string()),
        }
    }
}

/// Settings for parallel progress with batched delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchedConfig {
    /// Maximum number of items progressing in the same step.
    pub parallel_limit: u32,
    /// Size of the queue prefix that must be complete before delivery.
    pub starport_limit: u32,
    /// Ascending remaining-time thresholds (ticks) for countdown cues.
    pub countdown_thresholds: Vec<u32>,
    /// Cue played for each threshold, same length as the thresholds.
    pub countdown_cues: Vec<String>,
    /// Ticks after an admission attempt during which no countdown cue fires.
    pub suppression_ticks: u32,
}

impl Default for BatchedConfig {
    fn default() -> Self {
        Self {
            parallel_limit: u32::MAX,
            starport_limit: u32::MAX,
            countdown_thresholds: Vec::new(),
            countdown_cues: Vec::new(),
            suppression_ticks: 500,
        }
    }
}

impl BatchedConfig {
    /// Check if countdown cues replace the per-delivery ready cue.
    #[must_use]
    pub fn has_countdown(&self) -> bool {
        !self.countdown_thresholds.is_empty()
    }

    fn validate(&self, queue: &str) -> std::result::Result<(), ConfigError> {
        if self.parallel_limit == 0 {
            return Err(ConfigError::InvalidParallelLimit {
                queue: queue.to_string(),
            });
        }
        if self.starport_limit == 0 {
            return Err(ConfigError::InvalidStarportLimit {
                queue: queue.to_string(),
            });
        }
        if self.countdown_thresholds.len() != self.countdown_cues.len() {
            return Err(ConfigError::MismatchedCountdown {
                queue: queue.to_string(),
                thresholds: self.countdown_thresholds.len(),
                cues: self.countdown_cues.len(),
            });
        }
        if self.countdown_thresholds.contains(&0) {
            return Err(ConfigError::ZeroThreshold {
                queue: queue.to_string(),
            });
        }
        if self.countdown_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::UnsortedCountdown {
                queue: queue.to_string(),
            });
        }
        Ok(())
    }
}

/// How a queue advances and delivers its items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueueMode {
    /// Only the head item progresses; each item is delivered on its own.
    #[default]
    Sequential,
    /// Several items progress at once; delivery waits for a whole prefix.
    ParallelBatched(BatchedConfig),
}

/// Configuration of one production queue.
///
/// # Example RON
///
/// ```ron
/// QueueConfig(
///     queue_type: "Vehicle",
///     item_limit: 5,
///     low_power_slowdown: 3,
///     cues: QueueCues(limited: Some("BuildLimitReached")),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Production category (e.g. "Building", "Infantry", "Vehicle").
    pub queue_type: String,

    /// Factions allowed to use this queue. Empty allows every faction.
    #[serde(default)]
    pub factions: BTreeSet<String>,

    /// Keep the original faction when the facility changes owner.
    #[serde(default = "default_true")]
    pub sticky: bool,

    /// Percentage applied to every build time in this queue.
    #[serde(default = "default_percent")]
    pub build_duration_modifier: u32,

    /// Maximum queued items of a single type (0 = unlimited).
    #[serde(default = "default_item_limit")]
    pub item_limit: u32,

    /// Maximum queued items across all types (0 = unlimited).
    #[serde(default)]
    pub queue_limit: u32,

    /// Maximum items a single order may queue, even with every other limit
    /// lifted.
    #[serde(default = "default_order_limit")]
    pub order_limit: u32,

    /// Progress happens every n-th step while power is degraded.
    #[serde(default = "default_slowdown")]
    pub low_power_slowdown: i32,

    /// Notification cue names.
    #[serde(default)]
    pub cues: QueueCues,

    /// Progress and delivery strategy.
    #[serde(default)]
    pub mode: QueueMode,
}

const fn default_true() -> bool {
    true
}

const fn default_percent() -> u32 {
    100
}

const fn default_item_limit() -> u32 {
    999
}

const fn default_order_limit() -> u32 {
    1000
}

const fn default_slowdown() -> i32 {
    3
}

impl QueueConfig {
    /// Create a sequential queue configuration with stock defaults.
    #[must_use]
    pub fn new(queue_type: impl Into<String>) -> Self {
        Self {
            queue_type: queue_type.into(),
            factions: BTreeSet::new(),
            sticky: true,
            build_duration_modifier: default_percent(),
            item_limit: default_item_limit(),
            queue_limit: 0,
            order_limit: default_order_limit(),
            low_power_slowdown: default_slowdown(),
            cues: QueueCues::default(),
            mode: QueueMode::Sequential,
        }
    }

    /// Switch to parallel progress with batched delivery.
    #[must_use]
    pub fn batched(mut self, batched: BatchedConfig) -> Self {
        self.mode = QueueMode::ParallelBatched(batched);
        self
    }

    /// Set the per-type item limit.
    #[must_use]
    pub fn with_item_limit(mut self, limit: u32) -> Self {
        self.item_limit = limit;
        self
    }

    /// Set the total queue length limit.
    #[must_use]
    pub fn with_queue_limit(mut self, limit: u32) -> Self {
        self.queue_limit = limit;
        self
    }

    /// Set the per-order admission cap.
    #[must_use]
    pub fn with_order_limit(mut self, limit: u32) -> Self {
        self.order_limit = limit;
        self
    }

    /// Set the low-power slowdown factor.
    #[must_use]
    pub fn with_slowdown(mut self, factor: i32) -> Self {
        self.low_power_slowdown = factor;
        self
    }

    /// Restrict the queue to a faction.
    #[must_use]
    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.factions.insert(faction.into());
        self
    }

    /// Set whether the faction survives an owner change.
    #[must_use]
    pub fn with_sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    /// Replace the cue names.
    #[must_use]
    pub fn with_cues(mut self, cues: QueueCues) -> Self {
        self.cues = cues;
        self
    }

    /// Check if a faction may use this queue.
    #[must_use]
    pub fn allows_faction(&self, faction: &str) -> bool {
        self.factions.is_empty() || self.factions.contains(faction)
    }

    /// The validated slowdown factor.
    #[must_use]
    pub fn slowdown_factor(&self) -> u32 {
        u32::try_from(self.low_power_slowdown.max(1)).unwrap_or(1)
    }

    /// Check the configuration for load-time errors.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.queue_type.is_empty() {
            return Err(ConfigError::EmptyQueueType);
        }
        if self.low_power_slowdown <= 0 {
            return Err(ConfigError::InvalidSlowdown {
                queue: self.queue_type.clone(),
                value: self.low_power_slowdown,
            });
        }
        if self.order_limit == 0 {
            return Err(ConfigError::InvalidOrderLimit {
                queue: self.queue_type.clone(),
            });
        }
        if let QueueMode::ParallelBatched(batched) = &self.mode {
            batched.validate(&self.queue_type)?;
        }
        Ok(())
    }
}

/// A complete production ruleset: the catalog plus every queue definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ruleset {
    /// Every buildable item.
    pub catalog: Vec<CatalogEntry>,
    /// Every queue definition, one per category.
    pub queues: Vec<QueueConfig>,
}

impl Ruleset {
    /// Parse and validate a ruleset from RON text.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Self::parse_labelled(ron, "<inline>")
    }

    /// Parse and validate a ruleset, labelling parse errors with `label`.
    pub fn parse_labelled(ron: &str, label: &str) -> Result<Self> {
        let ruleset: Self = ron::from_str(ron).map_err(|e| FoundryError::DataParse {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Check every queue and catalog entry.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for queue in &self.queues {
            queue.validate()?;
            if !seen.insert(queue.queue_type.as_str()) {
                return Err(ConfigError::DuplicateQueue(queue.queue_type.clone()));
            }
        }
        self.build_catalog().map(|_| ())
    }

    /// Build the indexed catalog.
    pub fn build_catalog(&self) -> std::result::Result<Catalog, ConfigError> {
        Catalog::from_entries(self.catalog.iter().cloned())
    }

    /// Find the queue definition for a category.
    #[must_use]
    pub fn queue(&self, queue_type: &str) -> Option<&QueueConfig> {
        self.queues.iter().find(|q| q.queue_type == queue_type)
    }
}
