//! Task category registry.
//!
//! Maps task identifiers to their [`CategoryDescriptor`]. This is the single
//! place a task's measurement regime is decided; callers then dispatch through
//! [`crate::strategy::strategy_for`].
//!
//! ## Permissive fallback
//!
//! A registry may carry a fallback category. When set, an unregistered task
//! resolves to a descriptor of that category (labelled with the task's own
//! name) instead of failing with `UnknownTask`. This leniency exists so tasks
//! registered late still get scored; it is intentional and defaults to
//! throughput in [`CategoryRegistry::permissive`].

use std::collections::BTreeMap;

use crate::domain::{CategoryDescriptor, CategoryKind, Result, ScoreError};
use crate::obs;
use crate::scoring::ScoringConfig;

/// Task identifier → descriptor table plus the scoring constants shared by
/// every task.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    descriptors: BTreeMap<String, CategoryDescriptor>,
    fallback: Option<CategoryKind>,
    scoring: ScoringConfig,
}

impl CategoryRegistry {
    /// Empty registry; unregistered tasks fail with `UnknownTask`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry that resolves unregistered tasks to throughput.
    pub fn permissive() -> Self {
        Self::new().with_fallback(Some(CategoryKind::Throughput))
    }

    pub fn with_fallback(mut self, fallback: Option<CategoryKind>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_scoring_config(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Register `task_id` with the category's default weights.
    pub fn register(mut self, task_id: impl Into<String>, kind: CategoryKind) -> Self {
        let task_id = task_id.into();
        let descriptor = CategoryDescriptor::new(task_id.clone(), kind);
        self.descriptors.insert(task_id, descriptor);
        self
    }

    /// Register a prebuilt descriptor under its label.
    pub fn insert(&mut self, descriptor: CategoryDescriptor) {
        self.descriptors.insert(descriptor.label.clone(), descriptor);
    }

    pub fn fallback(&self) -> Option<CategoryKind> {
        self.fallback
    }

    pub fn scoring_config(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.descriptors.contains_key(task_id)
    }

    /// Registered task identifiers in lexical order.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    /// Resolve `task_id`, applying the fallback when one is configured.
    pub fn descriptor_for(&self, task_id: &str) -> Result<CategoryDescriptor> {
        if let Some(d) = self.descriptors.get(task_id) {
            return Ok(d.clone());
        }
        match self.fallback {
            Some(kind) => {
                obs::emit_fallback_category(task_id, kind.as_str());
                Ok(CategoryDescriptor::new(task_id, kind))
            }
            None => Err(ScoreError::UnknownTask {
                task_id: task_id.to_string(),
            }),
        }
    }

    /// Resolve `task_id`, defaulting to throughput regardless of the
    /// configured fallback.
    pub fn descriptor_or_default(&self, task_id: &str) -> CategoryDescriptor {
        self.descriptors.get(task_id).cloned().unwrap_or_else(|| {
            obs::emit_fallback_category(task_id, CategoryKind::Throughput.as_str());
            CategoryDescriptor::new(task_id, CategoryKind::Throughput)
        })
    }
}
