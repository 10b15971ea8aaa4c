//! Throughput regime: scored by execution time, lower is better.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::domain::category::{AVG_TIME, BEST_TIME, QUALITY};
use crate::domain::{
    CategoryKind, ImplementationAggregate, MetricDetail, NormalizedMetrics, Result,
    ScoreBreakdown, ScoreError, ScoringWeights, SubScore, ThroughputOutcome,
};
use crate::scoring::{is_measured_time, mean_in_order, quality_score, ScoringConfig, TimeBounds};
use crate::strategy::{CategoryStrategy, ScoreInput, TimeSummary};

const FIELD: &str = "execution_time";

fn invalid(reason: impl Into<String>) -> ScoreError {
    ScoreError::InvalidMetric {
        field: FIELD.to_string(),
        reason: reason.into(),
    }
}

/// Strategy for throughput tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThroughputStrategy;

impl CategoryStrategy for ThroughputStrategy {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Throughput
    }

    /// Fails with `InvalidMetric` when `execution_time` is missing, not a
    /// number, negative or non-finite. A zero time is accepted but marks the
    /// run unsuccessful.
    fn extract(&self, raw_outcome: &serde_json::Value) -> Result<NormalizedMetrics> {
        if !raw_outcome.is_object() {
            return Err(invalid("outcome is not an object"));
        }
        let outcome = ThroughputOutcome::deserialize(raw_outcome)
            .map_err(|e| invalid(format!("not a number: {e}")))?;
        let t = outcome
            .execution_time
            .ok_or_else(|| invalid("missing"))?;
        if !t.is_finite() {
            return Err(invalid(format!("must be finite, got {t}")));
        }
        if t < 0.0 {
            return Err(invalid(format!("must be non-negative, got {t}")));
        }

        Ok(NormalizedMetrics {
            primary_metric: t,
            success: is_measured_time(t),
            execution_time: t,
            detail: MetricDetail::Throughput,
        })
    }

    /// The successful run with the lowest time; earliest wins ties. Falls back
    /// to the first run when none succeeded.
    fn select_best(&self, runs: &[NormalizedMetrics]) -> Option<usize> {
        if runs.is_empty() {
            return None;
        }
        let best = runs
            .iter()
            .enumerate()
            .filter(|(_, m)| is_measured_time(m.execution_time))
            .fold(None::<(usize, f64)>, |acc, (i, m)| match acc {
                Some((_, t)) if t <= m.execution_time => acc,
                _ => Some((i, m.execution_time)),
            });
        Some(best.map_or(0, |(i, _)| i))
    }

    fn time_summary(&self, runs: &[NormalizedMetrics]) -> TimeSummary {
        let measured = || {
            runs.iter()
                .map(|m| m.execution_time)
                .filter(|t| is_measured_time(*t))
        };
        TimeSummary {
            best: measured().reduce(f64::min),
            average: mean_in_order(measured()),
        }
    }

    fn task_bounds(
        &self,
        runs: &[NormalizedMetrics],
        config: &ScoringConfig,
    ) -> Option<TimeBounds> {
        TimeBounds::from_times(
            runs.iter().map(|m| m.execution_time),
            config.min_time_window_secs,
        )
    }

    /// `0.4 * time(best) + 0.3 * time(avg) + 0.3 * quality` with the default
    /// weights. Time sub-scores are 0 when either the task bounds or the
    /// implementation's own successful times are missing.
    fn score(
        &self,
        input: &ScoreInput<'_>,
        weights: &ScoringWeights,
        config: &ScoringConfig,
    ) -> ScoreBreakdown {
        let own = self.time_summary(input.runs);
        let (best_value, avg_value) = match (input.bounds, own.best, own.average) {
            (Some(bounds), Some(best), Some(avg)) => (bounds.score(best), bounds.score(avg)),
            _ => (0.0, 0.0),
        };
        let quality = quality_score(input.worst_style_offenses, config.quality_offense_ceiling);

        ScoreBreakdown::from_components(vec![
            SubScore {
                name: BEST_TIME.to_string(),
                value: best_value,
                weight: weights.weight(BEST_TIME),
            },
            SubScore {
                name: AVG_TIME.to_string(),
                value: avg_value,
                weight: weights.weight(AVG_TIME),
            },
            SubScore {
                name: QUALITY.to_string(),
                value: quality,
                weight: weights.weight(QUALITY),
            },
        ])
    }

    /// Ascending by own best time; implementations without a successful run
    /// go last. Ties break on implementation identifier.
    fn compare_ranked(
        &self,
        a: &ImplementationAggregate,
        b: &ImplementationAggregate,
    ) -> Ordering {
        let by_time = match (a.best_own_time, b.best_own_time) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_time.then_with(|| a.implementation.cmp(&b.implementation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metrics(t: f64) -> NormalizedMetrics {
        ThroughputStrategy
            .extract(&json!({ "execution_time": t }))
            .expect("valid outcome")
    }

    #[test]
    fn test_extract_valid_time() {
        let m = metrics(0.25);
        assert_eq!(m.primary_metric, 0.25);
        assert_eq!(m.execution_time, 0.25);
        assert!(m.success);
        assert_eq!(m.category(), CategoryKind::Throughput);
    }

    #[test]
    fn test_extract_zero_time_is_not_success() {
        let m = metrics(0.0);
        assert!(!m.success);
        assert_eq!(m.primary_metric, 0.0);
    }

    #[test]
    fn test_extract_rejects_bad_outcomes() {
        let cases = [
            json!({}),
            json!({ "execution_time": null }),
            json!({ "execution_time": -0.5 }),
            json!({ "execution_time": "fast" }),
            json!([1.0]),
            json!("garbage"),
        ];
        for raw in cases {
            let err = ThroughputStrategy.extract(&raw).unwrap_err();
            assert!(
                matches!(err, ScoreError::InvalidMetric { ref field, .. } if field == "execution_time"),
                "unexpected error for {raw}: {err}"
            );
        }
    }

    #[test]
    fn test_extract_does_not_mutate_input() {
        let raw = json!({ "execution_time": 0.3, "extra": true });
        let before = raw.clone();
        let _ = ThroughputStrategy.extract(&raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn test_select_best_prefers_lowest_successful_time() {
        let runs = vec![metrics(0.4), metrics(0.0), metrics(0.2), metrics(0.2)];
        assert_eq!(ThroughputStrategy.select_best(&runs), Some(2));

        let failed = vec![metrics(0.0), metrics(0.0)];
        assert_eq!(ThroughputStrategy.select_best(&failed), Some(0));
    }

    #[test]
    fn test_time_summary_skips_unsuccessful() {
        let runs = vec![metrics(0.0), metrics(0.2), metrics(0.4)];
        let s = ThroughputStrategy.time_summary(&runs);
        assert_eq!(s.best, Some(0.2));
        assert!((s.average.expect("avg") - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_score_without_bounds_keeps_quality() {
        let runs = vec![metrics(0.2)];
        let input = ScoreInput {
            runs: &runs,
            best_index: 0,
            worst_style_offenses: 0,
            bounds: None,
        };
        let b = ThroughputStrategy.score(
            &input,
            &ScoringWeights::defaults(CategoryKind::Throughput),
            &ScoringConfig::default(),
        );
        assert!((b.score - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_with_degenerate_bounds_is_100() {
        let runs = vec![metrics(0.2), metrics(0.2)];
        let input = ScoreInput {
            runs: &runs,
            best_index: 0,
            worst_style_offenses: 0,
            bounds: Some(TimeBounds::new(0.2, 0.2)),
        };
        let b = ThroughputStrategy.score(
            &input,
            &ScoringWeights::defaults(CategoryKind::Throughput),
            &ScoringConfig::default(),
        );
        assert_eq!(b.score, 100.0);
    }
}
