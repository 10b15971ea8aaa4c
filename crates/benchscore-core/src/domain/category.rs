//! Category kinds, metric field declarations and scoring weights.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, ScoreError};

/// Sub-score names used by the throughput formula.
pub const BEST_TIME: &str = "best_time";
pub const AVG_TIME: &str = "avg_time";
pub const QUALITY: &str = "quality";

/// Sub-score names used by the repair formula (`quality` is shared).
pub const SUCCESS: &str = "success";
pub const TIME_BONUS: &str = "time_bonus";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Measurement regime of a benchmark task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Scored primarily by execution time (lower is better).
    Throughput,
    /// Scored primarily by fraction of tests passed after a repair attempt.
    Repair,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Throughput => "throughput",
            Self::Repair => "repair",
        }
    }

    /// Sub-score names this category's formula produces, in breakdown order.
    pub fn sub_score_names(self) -> &'static [&'static str] {
        match self {
            Self::Throughput => &[BEST_TIME, AVG_TIME, QUALITY],
            Self::Repair => &[SUCCESS, QUALITY, TIME_BONUS],
        }
    }

    /// Metric fields produced by this category's extractor.
    pub fn metric_fields(self) -> &'static [MetricField] {
        match self {
            Self::Throughput => THROUGHPUT_FIELDS,
            Self::Repair => REPAIR_FIELDS,
        }
    }

    fn default_weight_pairs(self) -> &'static [(&'static str, f64)] {
        match self {
            Self::Throughput => &[(BEST_TIME, 0.4), (AVG_TIME, 0.3), (QUALITY, 0.3)],
            Self::Repair => &[(SUCCESS, 0.7), (QUALITY, 0.2), (TIME_BONUS, 0.1)],
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How values of a metric field are averaged across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFieldKind {
    /// Arithmetic mean.
    Numeric,
    /// Fraction of runs where the value is `true`.
    Boolean,
}

/// A named metric field with its averaging kind, fixed per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricField {
    pub name: &'static str,
    pub kind: MetricFieldKind,
}

const fn numeric(name: &'static str) -> MetricField {
    MetricField {
        name,
        kind: MetricFieldKind::Numeric,
    }
}

const fn boolean(name: &'static str) -> MetricField {
    MetricField {
        name,
        kind: MetricFieldKind::Boolean,
    }
}

const THROUGHPUT_FIELDS: &[MetricField] = &[
    numeric("primary_metric"),
    numeric("execution_time"),
    boolean("success"),
];

const REPAIR_FIELDS: &[MetricField] = &[
    numeric("primary_metric"),
    numeric("success_rate"),
    numeric("tests_passed"),
    numeric("total_tests"),
    numeric("execution_time"),
    boolean("success"),
    boolean("syntax_valid"),
];

/// Sub-score weights for one category.
///
/// # Invariants
///
/// Names match the category's sub-scores exactly, every weight lies in
/// `[0, 1]` and the weights sum to 1.0. Checked once at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringWeights {
    weights: BTreeMap<String, f64>,
}

impl ScoringWeights {
    /// Validate and build a weight set for `category`.
    pub fn new(category: CategoryKind, weights: BTreeMap<String, f64>) -> Result<Self> {
        let invalid = |reason: String| ScoreError::InvalidWeights { category, reason };

        let expected = category.sub_score_names();
        for name in expected {
            if !weights.contains_key(*name) {
                return Err(invalid(format!("missing weight for `{name}`")));
            }
        }
        if let Some(extra) = weights.keys().find(|k| !expected.contains(&k.as_str())) {
            return Err(invalid(format!("unknown sub-score `{extra}`")));
        }
        for (name, w) in &weights {
            if !w.is_finite() || !(0.0..=1.0).contains(w) {
                return Err(invalid(format!("weight for `{name}` is {w}, must be in [0, 1]")));
            }
        }
        // Summed in the category's own order so the check is reproducible.
        let sum: f64 = expected.iter().map(|n| weights[*n]).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!("weights sum to {sum}, expected 1.0")));
        }

        Ok(Self { weights })
    }

    /// The built-in weights for `category` (0.4/0.3/0.3 and 0.7/0.2/0.1).
    pub fn defaults(category: CategoryKind) -> Self {
        let weights = category
            .default_weight_pairs()
            .iter()
            .map(|(name, w)| ((*name).to_string(), *w))
            .collect();
        Self { weights }
    }

    /// Weight for a sub-score; 0.0 for names outside the category.
    pub fn weight(&self, name: &str) -> f64 {
        self.weights.get(name).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Static configuration of one task's measurement regime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDescriptor {
    /// Task identifier this descriptor was resolved for.
    pub label: String,
    pub category_kind: CategoryKind,
    pub metric_fields: Vec<MetricField>,
    pub scoring_weights: ScoringWeights,
}

impl CategoryDescriptor {
    /// Descriptor with the category's default weights.
    pub fn new(label: impl Into<String>, category_kind: CategoryKind) -> Self {
        Self {
            label: label.into(),
            category_kind,
            metric_fields: category_kind.metric_fields().to_vec(),
            scoring_weights: ScoringWeights::defaults(category_kind),
        }
    }

    /// Replace the weights with a validated override.
    pub fn with_weights(mut self, weights: BTreeMap<String, f64>) -> Result<Self> {
        self.scoring_weights = ScoringWeights::new(self.category_kind, weights)?;
        Ok(self)
    }

    /// Ordered metric field names.
    pub fn metric_field_names(&self) -> Vec<&'static str> {
        self.metric_fields.iter().map(|f| f.name).collect()
    }
}
