//! Style-offense input supplied by an external static-analysis tool.
//!
//! The engine only consumes counts; how they are produced is up to the
//! implementor of [`StyleOffenseSource`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Injectable source of per-run style-offense counts.
///
/// Implement this trait to plug in a linter report, a database, or test stubs.
pub trait StyleOffenseSource: Send + Sync {
    /// Offense counts for every analysed run of `implementation` on `task_id`.
    /// An empty list means "no data" and is scored as zero offenses.
    fn offenses(&self, task_id: &str, implementation: &str) -> Vec<u32>;
}

/// Source that reports no offenses for anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStyleOffenses;

impl StyleOffenseSource for NoStyleOffenses {
    fn offenses(&self, _task_id: &str, _implementation: &str) -> Vec<u32> {
        Vec::new()
    }
}

/// In-memory offense counts keyed by task, then implementation.
///
/// Serializes as `{ "<task>": { "<implementation>": [counts...] } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleOffenseTable {
    counts: BTreeMap<String, BTreeMap<String, Vec<u32>>>,
}

impl StyleOffenseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one run's offense count.
    pub fn record(&mut self, task_id: &str, implementation: &str, count: u32) {
        self.counts
            .entry(task_id.to_string())
            .or_default()
            .entry(implementation.to_string())
            .or_default()
            .push(count);
    }

    pub fn with_record(mut self, task_id: &str, implementation: &str, count: u32) -> Self {
        self.record(task_id, implementation, count);
        self
    }
}

impl StyleOffenseSource for StyleOffenseTable {
    fn offenses(&self, task_id: &str, implementation: &str) -> Vec<u32> {
        self.counts
            .get(task_id)
            .and_then(|by_impl| by_impl.get(implementation))
            .cloned()
            .unwrap_or_default()
    }
}
