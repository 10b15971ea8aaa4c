//! Domain-level error taxonomy for the scoring engine.

use crate::domain::category::CategoryKind;

/// Scoring engine errors.
///
/// `MalformedOutcome` is the only variant that never reaches a caller of the
/// engine: the repair extractor builds it for logging and then substitutes
/// the canonical failure metrics.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("invalid metric `{field}`: {reason}")]
    InvalidMetric { field: String, reason: String },

    #[error("malformed outcome: {reason}")]
    MalformedOutcome { reason: String },

    #[error("no runs for implementation `{implementation}` on task `{task_id}`")]
    NoRuns {
        implementation: String,
        task_id: String,
    },

    #[error("unknown task: {task_id}")]
    UnknownTask { task_id: String },

    #[error("invalid scoring weights for {category}: {reason}")]
    InvalidWeights {
        category: CategoryKind,
        reason: String,
    },

    #[error(
        "run for `{implementation}` on task `{task_id}` is {actual}, task is registered as {expected}"
    )]
    CategoryMismatch {
        task_id: String,
        implementation: String,
        expected: CategoryKind,
        actual: CategoryKind,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for scoring engine operations.
pub type Result<T> = std::result::Result<T, ScoreError>;
