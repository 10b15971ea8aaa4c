//! Global atomic counters for scoring observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. once a report is built).
//!
//! Counters are write-only from the engine's point of view: no score,
//! aggregate or ordering ever reads them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lock-free atomic counters.
pub struct Metrics {
    runs_extracted: AtomicU64,
    outcomes_canonicalized: AtomicU64,
    aggregates_computed: AtomicU64,
    tasks_ranked: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            runs_extracted: AtomicU64::new(0),
            outcomes_canonicalized: AtomicU64::new(0),
            aggregates_computed: AtomicU64::new(0),
            tasks_ranked: AtomicU64::new(0),
        }
    }

    pub fn inc_runs_extracted(&self) {
        self.runs_extracted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_extracted", "counter incremented");
    }

    /// Increment when a malformed outcome is replaced by the canonical failure.
    pub fn inc_outcomes_canonicalized(&self) {
        self.outcomes_canonicalized.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "outcomes_canonicalized", "counter incremented");
    }

    pub fn inc_aggregates_computed(&self) {
        self.aggregates_computed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "aggregates_computed", "counter incremented");
    }

    pub fn inc_tasks_ranked(&self) {
        self.tasks_ranked.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "tasks_ranked", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            runs_extracted = self.runs_extracted(),
            outcomes_canonicalized = self.outcomes_canonicalized(),
            aggregates_computed = self.aggregates_computed(),
            tasks_ranked = self.tasks_ranked(),
        );
    }

    pub fn runs_extracted(&self) -> u64 {
        self.runs_extracted.load(Ordering::Relaxed)
    }

    pub fn outcomes_canonicalized(&self) -> u64 {
        self.outcomes_canonicalized.load(Ordering::Relaxed)
    }

    pub fn aggregates_computed(&self) -> u64 {
        self.aggregates_computed.load(Ordering::Relaxed)
    }

    pub fn tasks_ranked(&self) -> u64 {
        self.tasks_ranked.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.runs_extracted.store(0, Ordering::Relaxed);
        self.outcomes_canonicalized.store(0, Ordering::Relaxed);
        self.aggregates_computed.store(0, Ordering::Relaxed);
        self.tasks_ranked.store(0, Ordering::Relaxed);
    }
}
