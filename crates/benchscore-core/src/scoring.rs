//! Normalization and scoring math shared by the category formulas.
//!
//! Every sub-score is an inverse-linear mapping of a "lower is better" value
//! onto `[0, 100]`: 100 at or below the best bound, 0 at or above the worst
//! bound, linear in between.

use serde::{Deserialize, Serialize};

use crate::domain::{Result, ScoreError};

/// Tunable constants of the score formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Offense count at which the quality sub-score reaches 0.
    pub quality_offense_ceiling: u32,
    /// Smallest allowed `worst - best` window for throughput bounds, in seconds.
    pub min_time_window_secs: f64,
    /// Execution time at which the repair time bonus reaches 0, in seconds.
    pub repair_time_window_secs: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            quality_offense_ceiling: 50,
            min_time_window_secs: 0.001,
            repair_time_window_secs: 1.0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.quality_offense_ceiling == 0 {
            return Err(ScoreError::Config(
                "quality_offense_ceiling must be greater than 0".to_string(),
            ));
        }
        for (name, value) in [
            ("min_time_window_secs", self.min_time_window_secs),
            ("repair_time_window_secs", self.repair_time_window_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScoreError::Config(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Global throughput normalization bounds for one task.
///
/// Recomputed from the current result set every time a task is ranked, so
/// scores move as new runs arrive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub best_time: f64,
    pub worst_time: f64,
}

impl TimeBounds {
    pub fn new(best_time: f64, worst_time: f64) -> Self {
        Self {
            best_time,
            worst_time,
        }
    }

    /// Bounds over all measured (positive, finite) times, with the worst bound
    /// floored to `best + min_window`. `None` when no time qualifies.
    pub fn from_times<I>(times: I, min_window: f64) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut bounds: Option<(f64, f64)> = None;
        for t in times.into_iter().filter(|t| is_measured_time(*t)) {
            bounds = Some(match bounds {
                None => (t, t),
                Some((lo, hi)) => (lo.min(t), hi.max(t)),
            });
        }
        bounds.map(|(best, worst)| Self::new(best, worst.max(best + min_window)))
    }

    /// Inverse-linear time score against these bounds.
    pub fn score(&self, time: f64) -> f64 {
        time_score(time, self.best_time, self.worst_time)
    }
}

/// A time that counts as a successful measurement.
pub fn is_measured_time(t: f64) -> bool {
    t.is_finite() && t > 0.0
}

/// Arithmetic mean reduced in input order; `None` for an empty input.
///
/// Uses the incremental form `m += (x - m) / k`, so averaging `n` identical
/// values returns that value exactly.
pub fn mean_in_order<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut mean = 0.0;
    let mut count = 0u64;
    for x in values {
        count += 1;
        mean += (x - mean) / count as f64;
    }
    (count > 0).then_some(mean)
}

/// Map `value` onto `[0, 100]` with 100 at `best` and 0 at `worst`.
///
/// A degenerate window (`worst <= best`) scores every value 100. A NaN value
/// scores 0.
pub fn inverse_linear(value: f64, best: f64, worst: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    if worst.is_nan() || worst <= best {
        return 100.0;
    }
    if value <= best {
        100.0
    } else if value >= worst {
        0.0
    } else {
        100.0 * (1.0 - (value - best) / (worst - best))
    }
}

/// Throughput time score of `t` against the task's global bounds.
pub fn time_score(t: f64, best_time: f64, worst_time: f64) -> f64 {
    inverse_linear(t, best_time, worst_time)
}

/// Code-quality score: 100 at zero offenses, 0 at or above `ceiling`.
pub fn quality_score(offenses: u32, ceiling: u32) -> f64 {
    inverse_linear(f64::from(offenses), 0.0, f64::from(ceiling))
}

/// Repair speed bonus: 100 for an instant repair, 0 at or above `window` seconds.
pub fn repair_time_bonus(execution_time: f64, window: f64) -> f64 {
    inverse_linear(execution_time, 0.0, window)
}
