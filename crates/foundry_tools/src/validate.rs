//! Ruleset validation.

use std::fmt;
use std::path::Path;

use foundry_core::config::{QueueMode, Ruleset};
use foundry_core::error::{FoundryError, Result};

/// What a valid ruleset contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesetSummary {
    /// File the ruleset was loaded from.
    pub path: String,
    /// Number of catalog entries.
    pub items: usize,
    /// Queue categories, in definition order.
    pub queues: Vec<String>,
    /// Queue categories that deliver in batches.
    pub batched: Vec<String>,
}

impl fmt::Display for RulesetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} items, {} queues ({})",
            self.path,
            self.items,
            self.queues.len(),
            self.queues.join(", ")
        )?;
        if !self.batched.is_empty() {
            write!(f, ", batched: {}", self.batched.join(", "))?;
        }
        Ok(())
    }
}

impl RulesetSummary {
    fn of(path: &Path, ruleset: &Ruleset) -> Self {
        Self {
            path: path.display().to_string(),
            items: ruleset.catalog.len(),
            queues: ruleset.queues.iter().map(|q| q.queue_type.clone()).collect(),
            batched: ruleset
                .queues
                .iter()
                .filter(|q| matches!(q.mode, QueueMode::ParallelBatched(_)))
                .map(|q| q.queue_type.clone())
                .collect(),
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| FoundryError::DataParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Parse and validate one ruleset file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or fails
/// validation.
pub fn validate_ruleset_file(path: &Path) -> Result<RulesetSummary> {
    let contents = read(path)?;
    let ruleset = Ruleset::parse_labelled(&contents, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), items = ruleset.catalog.len(), "Ruleset valid");
    Ok(RulesetSummary::of(path, &ruleset))
}

/// Validate every `.ron` ruleset in a directory, in file name order.
///
/// # Errors
///
/// Returns the first error encountered.
pub fn validate_data_directory(path: &Path) -> Result<Vec<RulesetSummary>> {
    let entries = std::fs::read_dir(path).map_err(|e| FoundryError::DataParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut files: Vec<_> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    if files.is_empty() {
        tracing::warn!(path = %path.display(), "No ruleset files found");
    }

    files.iter().map(|file| validate_ruleset_file(file)).collect()
}
