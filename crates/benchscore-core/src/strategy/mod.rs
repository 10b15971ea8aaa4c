//! Per-category scoring strategies.
//!
//! Each [`CategoryKind`] has exactly one [`CategoryStrategy`] implementation
//! that knows how to extract metrics from a raw outcome, pick the best run,
//! score an implementation and order implementations. Everything outside this
//! module dispatches through [`strategy_for`] instead of matching on the kind.

use std::cmp::Ordering;

use crate::domain::{
    CategoryKind, ImplementationAggregate, NormalizedMetrics, Result, ScoreBreakdown,
    ScoringWeights,
};
use crate::scoring::{ScoringConfig, TimeBounds};

pub mod repair;
pub mod throughput;

pub use repair::RepairStrategy;
pub use throughput::ThroughputStrategy;

/// Inputs to a category score formula for one implementation.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    /// Extracted metrics of every run, in input order.
    pub runs: &'a [NormalizedMetrics],
    /// Index into `runs` of the selected best run.
    pub best_index: usize,
    pub worst_style_offenses: u32,
    /// Task-wide throughput bounds; unused by repair.
    pub bounds: Option<TimeBounds>,
}

/// Own-time summary of one implementation's successful runs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeSummary {
    pub best: Option<f64>,
    pub average: Option<f64>,
}

/// Capability interface implemented once per category kind.
pub trait CategoryStrategy: Send + Sync {
    fn kind(&self) -> CategoryKind;

    /// Turn one raw outcome into normalized metrics. Never mutates the input.
    fn extract(&self, raw_outcome: &serde_json::Value) -> Result<NormalizedMetrics>;

    /// Index of the best run. `None` only for an empty slice.
    fn select_best(&self, runs: &[NormalizedMetrics]) -> Option<usize>;

    /// Own-time summary used for throughput normalization.
    fn time_summary(&self, _runs: &[NormalizedMetrics]) -> TimeSummary {
        TimeSummary::default()
    }

    /// Normalization bounds over every run of a task. `None` for categories
    /// that do not normalize against other implementations.
    fn task_bounds(
        &self,
        _runs: &[NormalizedMetrics],
        _config: &ScoringConfig,
    ) -> Option<TimeBounds> {
        None
    }

    /// Apply the category's weighted score formula.
    fn score(
        &self,
        input: &ScoreInput<'_>,
        weights: &ScoringWeights,
        config: &ScoringConfig,
    ) -> ScoreBreakdown;

    /// Total order used for the final ranking (first = best).
    fn compare_ranked(&self, a: &ImplementationAggregate, b: &ImplementationAggregate)
        -> Ordering;
}

/// The strategy for a category kind.
pub fn strategy_for(kind: CategoryKind) -> &'static dyn CategoryStrategy {
    match kind {
        CategoryKind::Throughput => &ThroughputStrategy,
        CategoryKind::Repair => &RepairStrategy,
    }
}
