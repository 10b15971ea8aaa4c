//! Ranking of implementations per task, and multi-task report building.
//!
//! The sort key differs by category and is owned by each strategy:
//! throughput orders by fastest own time, repair orders by final score.
//!
//! Inputs are borrowed slices. Callers that ingest runs concurrently must hand
//! over an immutable snapshot; the engine never reads a growing collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{extract_runs, Aggregator};
use crate::domain::{
    CategoryKind, ImplementationAggregate, NormalizedMetrics, RawRunRecord, Result,
};
use crate::metrics::METRICS;
use crate::obs::{self, TaskSpan};
use crate::offenses::{NoStyleOffenses, StyleOffenseSource};
use crate::registry::CategoryRegistry;
use crate::scoring::TimeBounds;
use crate::strategy::strategy_for;

/// Run ingestion input: task identifier → every run recorded for that task.
pub type RunSet = BTreeMap<String, Vec<RawRunRecord>>;

/// One position in a task ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position.
    pub rank: usize,
    pub implementation: String,
    pub aggregate: ImplementationAggregate,
}

/// An implementation left out of a ranking, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedImplementation {
    pub implementation: String,
    pub error: String,
}

/// Ranked aggregates for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRanking {
    pub task_id: String,
    pub category: CategoryKind,
    /// Throughput normalization bounds used for every implementation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<TimeBounds>,
    /// Implementations in rank order.
    pub ranked: Vec<RankedEntry>,
    /// Implementations that could not be aggregated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedImplementation>,
}

impl TaskRanking {
    /// Every aggregate keyed by implementation identifier.
    pub fn aggregates(&self) -> BTreeMap<&str, &ImplementationAggregate> {
        self.ranked
            .iter()
            .map(|e| (e.implementation.as_str(), &e.aggregate))
            .collect()
    }

    pub fn get(&self, implementation: &str) -> Option<&RankedEntry> {
        self.ranked.iter().find(|e| e.implementation == implementation)
    }

    /// Implementation identifiers in rank order.
    pub fn order(&self) -> Vec<&str> {
        self.ranked.iter().map(|e| e.implementation.as_str()).collect()
    }
}

/// A task that could not be ranked at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub task_id: String,
    pub error: String,
}

/// Rankings for every task in a run set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub tasks: BTreeMap<String, TaskRanking>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_tasks: Vec<TaskFailure>,
}

/// Ranks implementations per task against a registry and offense source.
pub struct RankingSelector<'a> {
    registry: &'a CategoryRegistry,
    offenses: &'a dyn StyleOffenseSource,
}

impl<'a> RankingSelector<'a> {
    /// Selector that treats every implementation as offense-free.
    pub fn new(registry: &'a CategoryRegistry) -> Self {
        Self {
            registry,
            offenses: &NoStyleOffenses,
        }
    }

    pub fn with_offenses(mut self, offenses: &'a dyn StyleOffenseSource) -> Self {
        self.offenses = offenses;
        self
    }

    /// Rank every implementation that has runs for `task_id`.
    ///
    /// Fails only when the task itself cannot be resolved. An implementation
    /// whose runs cannot be aggregated is listed in `skipped` and the rest of
    /// the task is still ranked.
    pub fn rank(&self, task_id: &str, all_runs: &[RawRunRecord]) -> Result<TaskRanking> {
        let _span = TaskSpan::enter(task_id);
        let descriptor = self.registry.descriptor_for(task_id)?;
        let strategy = strategy_for(descriptor.category_kind);
        let aggregator = Aggregator::new(self.registry);

        let mut groups: BTreeMap<&str, Vec<&RawRunRecord>> = BTreeMap::new();
        for run in all_runs {
            groups
                .entry(run.implementation.as_str())
                .or_default()
                .push(run);
        }

        let mut skipped = Vec::new();
        let mut extracted: Vec<(&str, Vec<&RawRunRecord>, Vec<NormalizedMetrics>)> = Vec::new();
        for (implementation, runs) in groups {
            match extract_runs(&descriptor, implementation, task_id, &runs) {
                Ok(metrics) => extracted.push((implementation, runs, metrics)),
                Err(err) => {
                    obs::emit_implementation_skipped(implementation, &err);
                    skipped.push(SkippedImplementation {
                        implementation: implementation.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        // Bounds come from the current result set only; nothing is cached
        // between calls, so scores shift as runs are added.
        let all_metrics: Vec<NormalizedMetrics> = extracted
            .iter()
            .flat_map(|(_, _, metrics)| metrics.iter().cloned())
            .collect();
        let bounds = strategy.task_bounds(&all_metrics, self.registry.scoring_config());

        let mut aggregates = Vec::with_capacity(extracted.len());
        for (implementation, runs, metrics) in &extracted {
            let offenses = self.offenses.offenses(task_id, implementation);
            match aggregator.aggregate_metrics(
                &descriptor,
                implementation,
                task_id,
                runs,
                metrics,
                &offenses,
                bounds,
            ) {
                Ok(aggregate) => aggregates.push(aggregate),
                Err(err) => {
                    obs::emit_implementation_skipped(implementation, &err);
                    skipped.push(SkippedImplementation {
                        implementation: implementation.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        aggregates.sort_by(|a, b| strategy.compare_ranked(a, b));
        let ranked: Vec<RankedEntry> = aggregates
            .into_iter()
            .enumerate()
            .map(|(i, aggregate)| RankedEntry {
                rank: i + 1,
                implementation: aggregate.implementation.clone(),
                aggregate,
            })
            .collect();

        METRICS.inc_tasks_ranked();
        obs::emit_task_ranked(task_id, ranked.len(), skipped.len());

        Ok(TaskRanking {
            task_id: task_id.to_string(),
            category: descriptor.category_kind,
            bounds,
            ranked,
            skipped,
        })
    }

    /// Rank every task in `run_set` independently. A task that fails is
    /// recorded in `failed_tasks` and does not stop the others.
    pub fn build_report(&self, run_set: &RunSet) -> BenchmarkReport {
        let mut report = BenchmarkReport::default();
        for (task_id, runs) in run_set {
            match self.rank(task_id, runs) {
                Ok(ranking) => {
                    report.tasks.insert(task_id.clone(), ranking);
                }
                Err(err) => {
                    obs::emit_task_failed(task_id, &err);
                    report.failed_tasks.push(TaskFailure {
                        task_id: task_id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        report
    }
}

/// Rank one task with no style-offense input.
pub fn rank(
    registry: &CategoryRegistry,
    task_id: &str,
    all_runs: &[RawRunRecord],
) -> Result<TaskRanking> {
    RankingSelector::new(registry).rank(task_id, all_runs)
}
