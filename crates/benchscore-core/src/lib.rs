//! Benchscore Core Library
//!
//! Scores and ranks implementations of benchmark tasks. Raw run records flow
//! through a category strategy (metric extraction), the [`Aggregator`]
//! (per-implementation averages and score) and the [`RankingSelector`]
//! (per-task ordering) into a [`BenchmarkReport`].
//!
//! Every operation is a synchronous, deterministic function of its inputs.

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod offenses;
pub mod ranking;
pub mod registry;
pub mod reporting;
pub mod scoring;
pub mod strategy;
pub mod telemetry;

pub use domain::{
    AveragedMetrics, CategoryDescriptor, CategoryKind, ImplementationAggregate, MetricDetail,
    MetricField, MetricFieldKind, MetricValue, NormalizedMetrics, RawRunRecord, RepairMetrics,
    RepairOutcome, Result, ScoreBreakdown, ScoreError, ScoringWeights, SubScore,
    ThroughputOutcome,
};

pub use aggregate::{average_fields, Aggregator};
pub use config::{load_registry, TaskEntry, TaskTableConfig};
pub use offenses::{NoStyleOffenses, StyleOffenseSource, StyleOffenseTable};
pub use ranking::{
    rank, BenchmarkReport, RankedEntry, RankingSelector, RunSet, SkippedImplementation,
    TaskFailure, TaskRanking,
};
pub use registry::CategoryRegistry;
pub use reporting::{
    read_report_json, report_digest, write_report_json, ReportArtifact, REPORT_SCHEMA_VERSION,
};
pub use scoring::{
    inverse_linear, mean_in_order, quality_score, repair_time_bonus, time_score, ScoringConfig,
    TimeBounds,
};
pub use strategy::{
    strategy_for, CategoryStrategy, RepairStrategy, ScoreInput, ThroughputStrategy, TimeSummary,
};

pub use metrics::METRICS;
pub use obs::TaskSpan;
pub use telemetry::init_tracing;

/// Benchscore version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
