//! # Foundry Core
//!
//! Deterministic production scheduler for a real-time strategy simulation.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (integer amortization, fixed-point reporting)
//!
//! A production queue turns build orders into finished items over discrete
//! simulation steps. Each step it withdraws a share of the item's cost from
//! the owner's resource pool, honours admission limits and pause/cancel
//! commands, and hands finished items to a producer collaborator.
//!
//! ## Crate Structure
//!
//! - [`catalog`] - Static per-item production data
//! - [`config`] - Queue configuration and ruleset loading
//! - [`economy`] - Resource pool and power state
//! - [`collaborators`] - Producer, notification and ownership interfaces
//! - [`item`] - Per-order amortization state machine
//! - [`queue`] - Admission control, cancellation and the per-step tick
//! - [`batched`] - Parallel progress with batched delivery
//! - [`simulation`] - Fixed-step driver for many queues

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batched;
pub mod catalog;
pub mod collaborators;
pub mod config;
pub mod economy;
pub mod error;
pub mod events;
pub mod item;
pub mod math;
pub mod queue;
pub mod simulation;
pub mod state;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogEntry, ItemId};
    pub use crate::collaborators::{
        BatchRequest, Collaborators, FacilityId, NotificationSink, OwnedActors, PlayerId,
        ProduceRequest, Producer, ProducerId, ProducerSlot, ProductionInit,
    };
    pub use crate::config::{BatchedConfig, QueueConfig, QueueCues, QueueMode, Ruleset};
    pub use crate::economy::{PlayerResources, PowerState, ResourcePool};
    pub use crate::error::{ConfigError, FoundryError, Result};
    pub use crate::events::ProductionEvent;
    pub use crate::item::{ItemTick, ProductionItem};
    pub use crate::math::Fixed;
    pub use crate::queue::{AdmissionError, DeveloperMode, Owner, ProductionOrder, ProductionQueue};
    pub use crate::simulation::{SimCommand, Simulation};
    pub use crate::state::ProductionState;
}
