//! Error types for the production scheduler.

use thiserror::Error;

/// Result type alias using [`FoundryError`].
pub type Result<T> = std::result::Result<T, FoundryError>;

/// Top-level error type for scheduler setup and data loading.
///
/// Nothing in the per-step simulation path returns this type: stalls,
/// rejections and unavailable producers are regular outcomes, not errors.
#[derive(Debug, Error)]
pub enum FoundryError {
    /// A ruleset or queue configuration failed load-time validation.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParse {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Reference to an item that is not in the catalog.
    #[error("Unknown catalog item: {0}")]
    UnknownItem(String),

    /// Invalid scheduler state.
    #[error("Invalid scheduler state: {0}")]
    InvalidState(String),
}

/// Configuration problems detected while loading a ruleset.
///
/// These are fatal at load time and keep the configuration from being
/// accepted at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Low-power slowdown factor below one.
    #[error("Queue '{queue}' must have a low_power_slowdown of at least 1, got {value}")]
    InvalidSlowdown {
        /// Queue type.
        queue: String,
        /// Configured value.
        value: i32,
    },

    /// Countdown thresholds and cues differ in length.
    #[error("Queue '{queue}' has {thresholds} countdown thresholds but {cues} countdown cues")]
    MismatchedCountdown {
        /// Queue type.
        queue: String,
        /// Number of thresholds.
        thresholds: usize,
        /// Number of cues.
        cues: usize,
    },

    /// Countdown thresholds are not strictly ascending.
    #[error("Queue '{queue}' countdown thresholds must be strictly ascending")]
    UnsortedCountdown {
        /// Queue type.
        queue: String,
    },

    /// A countdown threshold of zero can never fire.
    #[error("Queue '{queue}' countdown thresholds must be greater than zero")]
    ZeroThreshold {
        /// Queue type.
        queue: String,
    },

    /// Parallel limit of zero would stall the queue forever.
    #[error("Queue '{queue}' parallel_limit must be at least 1")]
    InvalidParallelLimit {
        /// Queue type.
        queue: String,
    },

    /// Delivery batch limit of zero would deliver nothing.
    #[error("Queue '{queue}' starport_limit must be at least 1")]
    InvalidStarportLimit {
        /// Queue type.
        queue: String,
    },

    /// Order cap of zero would refuse every order.
    #[error("Queue '{queue}' order_limit must be at least 1")]
    InvalidOrderLimit {
        /// Queue type.
        queue: String,
    },

    /// Queue without a category.
    #[error("Queue type must not be empty")]
    EmptyQueueType,

    /// Two queues share the same category.
    #[error("Queue type '{0}' is defined more than once")]
    DuplicateQueue(String),

    /// Catalog entry with a per-purchase count of zero.
    #[error("Catalog item '{0}' must have a per-purchase count of at least 1")]
    InvalidPerPurchaseCount(String),

    /// Catalog entry with a negative cost.
    #[error("Catalog item '{0}' has a negative cost")]
    NegativeCost(String),

    /// Catalog entry defined twice.
    #[error("Catalog item '{0}' is defined more than once")]
    DuplicateItem(String),
}
