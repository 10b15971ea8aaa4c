//! Per-implementation aggregate and score breakdown types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::category::CategoryKind;
use crate::domain::run::NormalizedMetrics;

/// Per-field means across an implementation's runs.
///
/// Boolean fields hold the fraction of runs where the value was `true`.
/// A field no run reported is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AveragedMetrics {
    fields: BTreeMap<String, Option<f64>>,
}

impl AveragedMetrics {
    pub(crate) fn insert(&mut self, name: &str, value: Option<f64>) {
        self.fields.insert(name.to_string(), value);
    }

    /// Mean for `name`; `None` if the field is unknown or had no values.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied().flatten()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// One weighted component of a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub name: String,
    /// Component value in `[0, 100]`.
    pub value: f64,
    pub weight: f64,
}

impl SubScore {
    pub fn weighted(&self) -> f64 {
        self.weight * self.value
    }
}

/// Named sub-scores and the final score they produce.
///
/// # Invariants
///
/// `score` equals the weighted sum of `components` clamped to `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub components: Vec<SubScore>,
    pub score: f64,
}

impl ScoreBreakdown {
    /// Build from components, summing in component order and clamping.
    pub fn from_components(components: Vec<SubScore>) -> Self {
        let total: f64 = components.iter().map(SubScore::weighted).sum();
        let score = if total.is_finite() {
            total.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self { components, score }
    }

    pub fn component(&self, name: &str) -> Option<&SubScore> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Summary of one implementation on one task across all of its runs.
///
/// Always recomputed from run records and style-offense input; never a source
/// of truth on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationAggregate {
    pub implementation: String,
    pub task_id: String,
    pub category: CategoryKind,
    /// Number of runs aggregated (at least 1).
    pub run_count: usize,
    pub averaged_metrics: AveragedMetrics,
    /// Metrics of the run selected as this implementation's best result.
    pub best_run: NormalizedMetrics,
    /// Fastest successful time (throughput only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_own_time: Option<f64>,
    /// Mean successful time (throughput only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_own_time: Option<f64>,
    pub worst_style_offenses: u32,
    /// Final score in `[0, 100]`.
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_run_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<String>,
}

impl ImplementationAggregate {
    /// True when every run was canonicalized from a malformed outcome.
    pub fn all_runs_malformed(&self) -> bool {
        self.best_run.is_malformed()
    }
}
