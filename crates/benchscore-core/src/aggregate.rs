//! Per-implementation aggregation across repeated runs.
//!
//! [`Aggregator`] turns every run an implementation has on a task into one
//! [`ImplementationAggregate`]: extracted metrics averaged per field, the worst
//! style-offense count, the selected best run, and the category's score.

use std::cmp::Ordering;

use crate::domain::{
    AveragedMetrics, CategoryDescriptor, ImplementationAggregate, MetricField, MetricFieldKind,
    MetricValue, NormalizedMetrics, RawRunRecord, Result, ScoreError,
};
use crate::metrics::METRICS;
use crate::obs;
use crate::registry::CategoryRegistry;
use crate::scoring::{mean_in_order, TimeBounds};
use crate::strategy::{strategy_for, ScoreInput};

/// Aggregates runs using the registry's descriptors and scoring constants.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    registry: &'a CategoryRegistry,
}

impl<'a> Aggregator<'a> {
    pub fn new(registry: &'a CategoryRegistry) -> Self {
        Self { registry }
    }

    /// Aggregate one implementation on one task in isolation.
    ///
    /// Throughput bounds are taken from this implementation's own runs; use
    /// [`Aggregator::aggregate_with_bounds`] to score against a whole task.
    pub fn aggregate(
        &self,
        implementation: &str,
        task_id: &str,
        runs: &[RawRunRecord],
        style_offenses: &[u32],
    ) -> Result<ImplementationAggregate> {
        self.aggregate_with_bounds(implementation, task_id, runs, style_offenses, None)
    }

    /// Aggregate one implementation on one task against task-wide throughput
    /// bounds. When `bounds` is `None` the implementation's own successful
    /// times are used.
    ///
    /// Fails with `NoRuns` on an empty run list (a zero aggregate would be
    /// indistinguishable from a bad implementation), `UnknownTask` on a
    /// registry miss, `CategoryMismatch` when a run was recorded under another
    /// category and `InvalidMetric` on a malformed throughput outcome.
    pub fn aggregate_with_bounds(
        &self,
        implementation: &str,
        task_id: &str,
        runs: &[RawRunRecord],
        style_offenses: &[u32],
        bounds: Option<TimeBounds>,
    ) -> Result<ImplementationAggregate> {
        let descriptor = self.registry.descriptor_for(task_id)?;
        let runs: Vec<&RawRunRecord> = runs.iter().collect();
        let metrics = extract_runs(&descriptor, implementation, task_id, &runs)?;
        self.aggregate_metrics(
            &descriptor,
            implementation,
            task_id,
            &runs,
            &metrics,
            style_offenses,
            bounds,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn aggregate_metrics(
        &self,
        descriptor: &CategoryDescriptor,
        implementation: &str,
        task_id: &str,
        runs: &[&RawRunRecord],
        metrics: &[NormalizedMetrics],
        style_offenses: &[u32],
        bounds: Option<TimeBounds>,
    ) -> Result<ImplementationAggregate> {
        let strategy = strategy_for(descriptor.category_kind);
        let config = self.registry.scoring_config();

        let best_index = strategy
            .select_best(metrics)
            .ok_or_else(|| ScoreError::NoRuns {
                implementation: implementation.to_string(),
                task_id: task_id.to_string(),
            })?;
        let worst_style_offenses = style_offenses.iter().copied().max().unwrap_or(0);
        let own_times = strategy.time_summary(metrics);
        let bounds = bounds.or_else(|| strategy.task_bounds(metrics, config));

        let input = ScoreInput {
            runs: metrics,
            best_index,
            worst_style_offenses,
            bounds,
        };
        let score_breakdown = strategy.score(&input, &descriptor.scoring_weights, config);
        let (first_run_at, last_run_at) = timestamp_range(runs);

        let aggregate = ImplementationAggregate {
            implementation: implementation.to_string(),
            task_id: task_id.to_string(),
            category: descriptor.category_kind,
            run_count: metrics.len(),
            averaged_metrics: average_fields(&descriptor.metric_fields, metrics),
            best_run: metrics[best_index].clone(),
            best_own_time: own_times.best,
            avg_own_time: own_times.average,
            worst_style_offenses,
            score: score_breakdown.score,
            score_breakdown,
            first_run_at,
            last_run_at,
        };

        METRICS.inc_aggregates_computed();
        obs::emit_aggregate_computed(implementation, aggregate.run_count, aggregate.score);
        Ok(aggregate)
    }
}

/// Validate run categories and extract metrics for every run, in order.
pub(crate) fn extract_runs(
    descriptor: &CategoryDescriptor,
    implementation: &str,
    task_id: &str,
    runs: &[&RawRunRecord],
) -> Result<Vec<NormalizedMetrics>> {
    if runs.is_empty() {
        return Err(ScoreError::NoRuns {
            implementation: implementation.to_string(),
            task_id: task_id.to_string(),
        });
    }
    let strategy = strategy_for(descriptor.category_kind);

    runs.iter()
        .map(|run| {
            if run.category != descriptor.category_kind {
                return Err(ScoreError::CategoryMismatch {
                    task_id: task_id.to_string(),
                    implementation: implementation.to_string(),
                    expected: descriptor.category_kind,
                    actual: run.category,
                });
            }
            let metrics = strategy.extract(&run.raw_outcome)?;
            METRICS.inc_runs_extracted();
            Ok(metrics)
        })
        .collect()
}

/// Mean of every declared field over the runs that report it.
///
/// Field kinds come from the descriptor, not from the values: a value whose
/// kind disagrees with its declaration is ignored.
pub fn average_fields(fields: &[MetricField], metrics: &[NormalizedMetrics]) -> AveragedMetrics {
    let mut averaged = AveragedMetrics::default();
    for field in fields {
        let values = metrics
            .iter()
            .filter_map(|m| m.field(field.name))
            .filter_map(|value| match (field.kind, value) {
                (MetricFieldKind::Numeric, MetricValue::Numeric(x)) => Some(x),
                (MetricFieldKind::Boolean, MetricValue::Boolean(b)) => {
                    Some(if b { 1.0 } else { 0.0 })
                }
                _ => None,
            });
        averaged.insert(field.name, mean_in_order(values));
    }
    averaged
}

/// Earliest and latest run timestamps, display only.
///
/// Chronological when every timestamp parses, lexical otherwise.
fn timestamp_range(runs: &[&RawRunRecord]) -> (Option<String>, Option<String>) {
    let parsed: Option<Vec<_>> = runs.iter().map(|r| r.parsed_timestamp()).collect();
    let cmp = |a: &usize, b: &usize| -> Ordering {
        match &parsed {
            Some(ts) => ts[*a].cmp(&ts[*b]),
            None => runs[*a].timestamp.cmp(&runs[*b].timestamp),
        }
    };
    let first = (0..runs.len()).min_by(cmp);
    let last = (0..runs.len()).max_by(cmp);
    (
        first.map(|i| runs[i].timestamp.clone()),
        last.map(|i| runs[i].timestamp.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryKind, RepairOutcome};
    use serde_json::json;

    fn registry() -> CategoryRegistry {
        CategoryRegistry::new()
            .register("fib", CategoryKind::Throughput)
            .register("fix_parser", CategoryKind::Repair)
    }

    fn repair_run(passed: u64, total: u64, success: bool, syntax_valid: bool) -> RawRunRecord {
        RawRunRecord::repair(
            "impl",
            "2024-05-01T10:00:00Z",
            &RepairOutcome {
                tests_passed: passed,
                total_tests: total,
                success,
                execution_time: 0.5,
                syntax_valid,
                error_message: None,
            },
        )
    }

    #[test]
    fn test_empty_runs_is_no_runs() {
        let reg = registry();
        let err = Aggregator::new(&reg)
            .aggregate("impl", "fib", &[], &[])
            .unwrap_err();
        assert!(matches!(err, ScoreError::NoRuns { .. }));
    }

    #[test]
    fn test_unknown_task_propagates() {
        let reg = registry();
        let runs = vec![RawRunRecord::throughput("impl", "t", 0.1)];
        let err = Aggregator::new(&reg)
            .aggregate("impl", "nope", &runs, &[])
            .unwrap_err();
        assert!(matches!(err, ScoreError::UnknownTask { .. }));
    }

    #[test]
    fn test_invalid_throughput_metric_propagates() {
        let reg = registry();
        let runs = vec![
            RawRunRecord::throughput("impl", "t", 0.1),
            RawRunRecord::new("impl", "t", CategoryKind::Throughput, json!({})),
        ];
        let err = Aggregator::new(&reg)
            .aggregate("impl", "fib", &runs, &[])
            .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidMetric { .. }));
    }

    #[test]
    fn test_category_mismatch_rejected() {
        let reg = registry();
        let runs = vec![RawRunRecord::throughput("impl", "t", 0.1)];
        let err = Aggregator::new(&reg)
            .aggregate("impl", "fix_parser", &runs, &[])
            .unwrap_err();
        assert!(matches!(err, ScoreError::CategoryMismatch { .. }));
    }

    #[test]
    fn test_boolean_fields_average_as_fraction_true() {
        let reg = registry();
        let runs = vec![
            repair_run(1, 2, true, true),
            repair_run(2, 2, false, true),
            repair_run(0, 2, true, false),
            repair_run(2, 2, true, true),
        ];
        let agg = Aggregator::new(&reg)
            .aggregate("impl", "fix_parser", &runs, &[3, 9, 1])
            .expect("aggregate");
        let avg = |name: &str| agg.averaged_metrics.get(name).expect(name);
        assert_eq!(agg.run_count, 4);
        assert!((avg("success") - 0.75).abs() < 1e-12);
        assert!((avg("syntax_valid") - 0.75).abs() < 1e-12);
        assert!((avg("success_rate") - 0.625).abs() < 1e-12);
        assert!((avg("tests_passed") - 1.25).abs() < 1e-12);
        assert_eq!(agg.worst_style_offenses, 9);
    }

    #[test]
    fn test_identical_values_average_exactly() {
        let reg = registry();
        let runs: Vec<_> = (0..5)
            .map(|_| RawRunRecord::throughput("impl", "t", 0.1))
            .collect();
        let agg = Aggregator::new(&reg)
            .aggregate("impl", "fib", &runs, &[])
            .expect("aggregate");
        assert_eq!(agg.averaged_metrics.get("execution_time"), Some(0.1));
        assert_eq!(agg.avg_own_time, Some(0.1));
    }

    #[test]
    fn test_missing_style_offenses_default_to_zero() {
        let reg = registry();
        let runs = vec![RawRunRecord::throughput("impl", "t", 0.1)];
        let agg = Aggregator::new(&reg)
            .aggregate("impl", "fib", &runs, &[])
            .expect("aggregate");
        assert_eq!(agg.worst_style_offenses, 0);
        assert_eq!(agg.score_breakdown.component("quality").map(|c| c.value), Some(100.0));
    }

    #[test]
    fn test_average_fields_null_when_no_run_reports() {
        let fields = CategoryKind::Repair.metric_fields();
        let throughput_metrics = vec![NormalizedMetrics {
            primary_metric: 0.1,
            success: true,
            execution_time: 0.1,
            detail: crate::domain::MetricDetail::Throughput,
        }];
        let averaged = average_fields(fields, &throughput_metrics);
        assert!(averaged.contains("success_rate"));
        assert_eq!(averaged.get("success_rate"), None);
        assert_eq!(averaged.get("execution_time"), Some(0.1));
    }

    #[test]
    fn test_timestamp_range_chronological() {
        let runs = vec![
            RawRunRecord::throughput("impl", "2024-05-02T09:00:00+02:00", 0.1),
            RawRunRecord::throughput("impl", "2024-05-02T08:00:00Z", 0.1),
            RawRunRecord::throughput("impl", "2024-05-01T23:00:00Z", 0.1),
        ];
        let refs: Vec<&RawRunRecord> = runs.iter().collect();
        let (first, last) = timestamp_range(&refs);
        assert_eq!(first.as_deref(), Some("2024-05-01T23:00:00Z"));
        assert_eq!(last.as_deref(), Some("2024-05-02T08:00:00Z"));
    }
}
