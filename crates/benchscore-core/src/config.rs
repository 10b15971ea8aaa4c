//! Task category table configuration.
//!
//! The table is read from TOML (default) or JSON (`.json` extension):
//!
//! ```toml
//! fallback = "throughput"
//!
//! [scoring]
//! quality_offense_ceiling = 50
//!
//! [tasks.fib]
//! category = "throughput"
//!
//! [tasks.fix_parser]
//! category = "repair"
//! weights = { success = 0.7, quality = 0.2, time_bonus = 0.1 }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{CategoryDescriptor, CategoryKind, Result, ScoreError};
use crate::registry::CategoryRegistry;
use crate::scoring::ScoringConfig;

/// One task's entry in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskEntry {
    pub category: CategoryKind,
    /// Optional per-task weight override; validated against the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<BTreeMap<String, f64>>,
}

/// Parsed task category table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskTableConfig {
    /// Category for unregistered tasks; absent means they are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<CategoryKind>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskEntry>,
}

impl TaskTableConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a table file, choosing the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Validate scoring constants and weights, and build the registry.
    pub fn into_registry(self) -> Result<CategoryRegistry> {
        self.scoring.validate()?;

        let mut registry = CategoryRegistry::new()
            .with_fallback(self.fallback)
            .with_scoring_config(self.scoring);
        for (task_id, entry) in self.tasks {
            if task_id.trim().is_empty() {
                return Err(ScoreError::Config("task id must not be empty".to_string()));
            }
            let mut descriptor = CategoryDescriptor::new(task_id, entry.category);
            if let Some(weights) = entry.weights {
                descriptor = descriptor.with_weights(weights)?;
            }
            registry.insert(descriptor);
        }
        Ok(registry)
    }
}

/// Load and validate a task table file into a registry.
pub fn load_registry(path: &Path) -> Result<CategoryRegistry> {
    TaskTableConfig::load(path)?.into_registry()
}
