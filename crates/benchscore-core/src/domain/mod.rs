//! Domain models for the scoring engine.
//!
//! Canonical definitions for the core entities:
//! - `RawRunRecord`: one execution of one implementation on one task
//! - `NormalizedMetrics`: category-uniform projection of a run
//! - `CategoryDescriptor`: metric fields and scoring weights of a task's regime
//! - `ImplementationAggregate`: averaged metrics and score across runs

pub mod aggregate;
pub mod category;
pub mod error;
pub mod run;

// Re-export main types and errors
pub use aggregate::{AveragedMetrics, ImplementationAggregate, ScoreBreakdown, SubScore};
pub use category::{
    CategoryDescriptor, CategoryKind, MetricField, MetricFieldKind, ScoringWeights,
};
pub use error::{Result, ScoreError};
pub use run::{
    MetricDetail, MetricValue, NormalizedMetrics, RawRunRecord, RepairMetrics, RepairOutcome,
    ThroughputOutcome,
};
