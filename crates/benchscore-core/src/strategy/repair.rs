//! Repair regime: scored by the fraction of a fixed test suite passed.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::domain::category::{QUALITY, SUCCESS, TIME_BONUS};
use crate::domain::{
    CategoryKind, ImplementationAggregate, MetricDetail, NormalizedMetrics, RepairMetrics,
    RepairOutcome, Result, ScoreBreakdown, ScoreError, ScoringWeights, SubScore,
};
use crate::metrics::METRICS;
use crate::obs;
use crate::scoring::{quality_score, repair_time_bonus, ScoringConfig};
use crate::strategy::{CategoryStrategy, ScoreInput};

/// Strategy for repair-correctness tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepairStrategy;

impl RepairStrategy {
    fn parse(raw_outcome: &serde_json::Value) -> Result<RepairOutcome> {
        let malformed = |reason: String| ScoreError::MalformedOutcome { reason };

        let outcome =
            RepairOutcome::deserialize(raw_outcome).map_err(|e| malformed(e.to_string()))?;
        if outcome.tests_passed > outcome.total_tests {
            return Err(malformed(format!(
                "tests_passed {} exceeds total_tests {}",
                outcome.tests_passed, outcome.total_tests
            )));
        }
        if !outcome.execution_time.is_finite() || outcome.execution_time < 0.0 {
            return Err(malformed(format!(
                "execution_time must be finite and non-negative, got {}",
                outcome.execution_time
            )));
        }
        Ok(outcome)
    }

    /// `a` strictly beats `b` as a best-run candidate.
    fn beats(a: &NormalizedMetrics, b: &NormalizedMetrics) -> bool {
        let rate = |m: &NormalizedMetrics| m.success_rate().unwrap_or(0.0);
        rate(a)
            .total_cmp(&rate(b))
            .then_with(|| b.is_malformed().cmp(&a.is_malformed()))
            .then_with(|| b.execution_time.total_cmp(&a.execution_time))
            == Ordering::Greater
    }
}

impl CategoryStrategy for RepairStrategy {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Repair
    }

    /// Never fails: an outcome that is not the expected shape becomes the
    /// canonical all-zero failure record so that one bad run cannot abort a
    /// report. `success` is the harness-asserted flag and is deliberately not
    /// derived from `success_rate`.
    fn extract(&self, raw_outcome: &serde_json::Value) -> Result<NormalizedMetrics> {
        let outcome = match Self::parse(raw_outcome) {
            Ok(outcome) => outcome,
            Err(err) => {
                obs::emit_outcome_canonicalized(&err);
                METRICS.inc_outcomes_canonicalized();
                return Ok(NormalizedMetrics::repair_failure(err.to_string()));
            }
        };

        let success_rate = if outcome.total_tests > 0 {
            outcome.tests_passed as f64 / outcome.total_tests as f64
        } else {
            0.0
        };

        Ok(NormalizedMetrics {
            primary_metric: success_rate,
            success: outcome.success,
            execution_time: outcome.execution_time,
            detail: MetricDetail::Repair(RepairMetrics {
                tests_passed: outcome.tests_passed,
                total_tests: outcome.total_tests,
                success_rate,
                syntax_valid: outcome.syntax_valid,
                error_message: outcome.error_message,
                malformed: false,
            }),
        })
    }

    /// Highest success rate; ties prefer a well-formed run, then the faster
    /// run, then the earlier one.
    fn select_best(&self, runs: &[NormalizedMetrics]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, m) in runs.iter().enumerate() {
            match best {
                Some(j) if !Self::beats(m, &runs[j]) => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// `min(100, 0.7 * success + 0.2 * quality + 0.1 * time_bonus)` with the
    /// default weights, all taken from the best run. An implementation whose
    /// runs were all malformed, or a `best_index` outside `runs`, scores 0 on
    /// every component.
    fn score(
        &self,
        input: &ScoreInput<'_>,
        weights: &ScoringWeights,
        config: &ScoringConfig,
    ) -> ScoreBreakdown {
        let (success, quality, time_bonus) = match input.runs.get(input.best_index) {
            Some(best) if !best.is_malformed() => (
                best.success_rate().unwrap_or(0.0) * 100.0,
                quality_score(input.worst_style_offenses, config.quality_offense_ceiling),
                repair_time_bonus(best.execution_time, config.repair_time_window_secs),
            ),
            _ => (0.0, 0.0, 0.0),
        };

        ScoreBreakdown::from_components(vec![
            SubScore {
                name: SUCCESS.to_string(),
                value: success,
                weight: weights.weight(SUCCESS),
            },
            SubScore {
                name: QUALITY.to_string(),
                value: quality,
                weight: weights.weight(QUALITY),
            },
            SubScore {
                name: TIME_BONUS.to_string(),
                value: time_bonus,
                weight: weights.weight(TIME_BONUS),
            },
        ])
    }

    /// Descending by score, not success rate. Implementations with only
    /// malformed runs always go last. Ties break on implementation identifier.
    fn compare_ranked(
        &self,
        a: &ImplementationAggregate,
        b: &ImplementationAggregate,
    ) -> Ordering {
        a.all_runs_malformed()
            .cmp(&b.all_runs_malformed())
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.implementation.cmp(&b.implementation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(passed: u64, total: u64, success: bool, time: f64) -> serde_json::Value {
        json!({
            "tests_passed": passed,
            "total_tests": total,
            "success": success,
            "execution_time": time,
            "syntax_valid": true,
        })
    }

    fn extract(raw: serde_json::Value) -> NormalizedMetrics {
        RepairStrategy.extract(&raw).expect("repair extract never fails")
    }

    #[test]
    fn test_extract_success_rate() {
        let m = extract(outcome(3, 4, true, 0.2));
        assert_eq!(m.success_rate(), Some(0.75));
        assert_eq!(m.primary_metric, 0.75);
        assert!(m.success);
        assert!(!m.is_malformed());
    }

    #[test]
    fn test_extract_zero_total_tests_rate_is_zero() {
        let m = extract(outcome(0, 0, true, 0.1));
        let rate = m.success_rate().expect("rate");
        assert_eq!(rate, 0.0);
        assert!(rate.is_finite());
    }

    #[test]
    fn test_success_flag_independent_of_rate() {
        let asserted = extract(outcome(0, 10, true, 0.1));
        assert!(asserted.success);
        assert_eq!(asserted.success_rate(), Some(0.0));

        let denied = extract(outcome(10, 10, false, 0.1));
        assert!(!denied.success);
        assert_eq!(denied.success_rate(), Some(1.0));
    }

    #[test]
    fn test_extract_garbage_is_canonical_failure() {
        let cases = [
            json!("garbage"),
            json!(42),
            json!(null),
            json!([1, 2, 3]),
            json!({ "tests_passed": 1 }),
            json!({ "tests_passed": -1, "total_tests": 2, "success": true, "execution_time": 0.1, "syntax_valid": true }),
            outcome(5, 4, true, 0.1),
            outcome(1, 4, true, -0.1),
        ];
        for raw in cases {
            let m = extract(raw.clone());
            assert!(m.is_malformed(), "expected canonical failure for {raw}");
            assert_eq!(m.primary_metric, 0.0);
            assert!(!m.success);
            assert_eq!(m.execution_time, 0.0);
            assert_eq!(m.success_rate(), Some(0.0));
        }
    }

    #[test]
    fn test_select_best_highest_rate_then_well_formed_then_fast() {
        let runs = vec![
            extract(outcome(2, 4, true, 0.3)),
            extract(outcome(3, 4, true, 0.5)),
            extract(outcome(3, 4, true, 0.2)),
            extract(outcome(3, 4, true, 0.2)),
        ];
        assert_eq!(RepairStrategy.select_best(&runs), Some(2));

        let zeros = vec![
            extract(json!("garbage")),
            extract(outcome(0, 4, false, 0.9)),
        ];
        assert_eq!(RepairStrategy.select_best(&zeros), Some(1));
    }

    #[test]
    fn test_score_all_malformed_is_zero() {
        let runs = vec![extract(json!("garbage"))];
        let input = ScoreInput {
            runs: &runs,
            best_index: 0,
            worst_style_offenses: 0,
            bounds: None,
        };
        let b = RepairStrategy.score(
            &input,
            &ScoringWeights::defaults(CategoryKind::Repair),
            &ScoringConfig::default(),
        );
        assert_eq!(b.score, 0.0);
    }

    #[test]
    fn test_score_out_of_range_best_index_is_zero() {
        let runs = vec![extract(outcome(4, 4, true, 0.1))];
        for (runs, best_index) in [(&runs[..], 3), (&[][..], 0)] {
            let input = ScoreInput {
                runs,
                best_index,
                worst_style_offenses: 0,
                bounds: None,
            };
            let b = RepairStrategy.score(
                &input,
                &ScoringWeights::defaults(CategoryKind::Repair),
                &ScoringConfig::default(),
            );
            assert_eq!(b.score, 0.0);
            assert_eq!(b.components.len(), 3);
        }
    }

    #[test]
    fn test_score_perfect_repair_is_capped() {
        let runs = vec![extract(outcome(4, 4, true, 0.0))];
        let input = ScoreInput {
            runs: &runs,
            best_index: 0,
            worst_style_offenses: 0,
            bounds: None,
        };
        let b = RepairStrategy.score(
            &input,
            &ScoringWeights::defaults(CategoryKind::Repair),
            &ScoringConfig::default(),
        );
        assert!(b.score <= 100.0);
        assert!((b.score - 100.0).abs() < 1e-9);
    }
}
