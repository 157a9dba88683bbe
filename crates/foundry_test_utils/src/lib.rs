//! # Foundry Test Utilities
//!
//! Shared testing utilities for the scheduler crates:
//! - Recording collaborators and a harness that bundles them
//! - Standard catalog and queue fixtures
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
