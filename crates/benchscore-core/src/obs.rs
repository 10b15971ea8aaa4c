//! Structured observability hooks for scoring events.
//!
//! This module provides:
//! - Task-scoped tracing spans via the `TaskSpan` RAII guard
//! - Emission functions for key events: canonicalized outcomes, computed
//!   aggregates, skipped implementations, ranked and failed tasks
//!
//! Verbosity follows `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use tracing::{debug, info, warn};

/// RAII guard that enters a task-scoped tracing span while a task is ranked.
///
/// # Example
///
/// ```ignore
/// let _span = TaskSpan::enter("fib");
/// // every event emitted here carries task_id = "fib"
/// ```
pub struct TaskSpan {
    _span: tracing::span::EnteredSpan,
}

impl TaskSpan {
    pub fn enter(task_id: &str) -> Self {
        let span = tracing::info_span!("benchscore.task", task_id = %task_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a malformed repair outcome was replaced by the canonical failure.
pub fn emit_outcome_canonicalized(error: &dyn std::fmt::Display) {
    warn!(event = "outcome.canonicalized", error = %error);
}

/// Emit event: an aggregate was computed for one implementation.
pub fn emit_aggregate_computed(implementation: &str, run_count: usize, score: f64) {
    debug!(
        event = "aggregate.computed",
        implementation = %implementation,
        run_count = run_count,
        score = score,
    );
}

/// Emit event: an implementation was left out of a ranking (warning level).
pub fn emit_implementation_skipped(implementation: &str, error: &dyn std::fmt::Display) {
    warn!(event = "implementation.skipped", implementation = %implementation, error = %error);
}

/// Emit event: a task finished ranking.
pub fn emit_task_ranked(task_id: &str, ranked: usize, skipped: usize) {
    info!(
        event = "task.ranked",
        task_id = %task_id,
        ranked = ranked,
        skipped = skipped,
    );
}

/// Emit event: a whole task could not be ranked (warning level).
pub fn emit_task_failed(task_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "task.failed", task_id = %task_id, error = %error);
}

/// Emit event: an unregistered task resolved to the fallback category.
pub fn emit_fallback_category(task_id: &str, category: &str) {
    debug!(event = "registry.fallback", task_id = %task_id, category = %category);
}
