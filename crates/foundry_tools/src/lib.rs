//! # Foundry Development Tools
//!
//! Command-line tools for working with production rulesets:
//! - Ruleset validation
//! - Headless scenario runs with text or JSON reports

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod report;
pub mod scenario;
pub mod validate;
