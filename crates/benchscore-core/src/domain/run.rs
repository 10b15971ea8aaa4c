//! Raw run records and their normalized metric projection.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::category::CategoryKind;

/// One execution of one implementation on one task.
///
/// Produced by the external execution harness and never mutated afterwards.
/// `raw_outcome` stays untyped at this boundary: its shape is only checked by
/// the category's extractor, so garbage from the harness can still be ingested
/// and canonicalized instead of failing deserialization of the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRunRecord {
    /// Implementation identifier (e.g. the generating model's name).
    pub implementation: String,

    /// ISO-8601-like timestamp; display and ordering only.
    pub timestamp: String,

    /// Category the harness ran this record under.
    pub category: CategoryKind,

    /// Category-shaped outcome object. `null` when the harness recorded none.
    #[serde(default)]
    pub raw_outcome: serde_json::Value,
}

impl RawRunRecord {
    pub fn new(
        implementation: impl Into<String>,
        timestamp: impl Into<String>,
        category: CategoryKind,
        raw_outcome: serde_json::Value,
    ) -> Self {
        Self {
            implementation: implementation.into(),
            timestamp: timestamp.into(),
            category,
            raw_outcome,
        }
    }

    /// Convenience constructor for a throughput run.
    ///
    /// Non-finite times cannot be represented in JSON and become `null`,
    /// which the throughput extractor rejects.
    pub fn throughput(
        implementation: impl Into<String>,
        timestamp: impl Into<String>,
        execution_time: f64,
    ) -> Self {
        Self::new(
            implementation,
            timestamp,
            CategoryKind::Throughput,
            serde_json::json!({ "execution_time": execution_time }),
        )
    }

    /// Convenience constructor for a repair run.
    pub fn repair(
        implementation: impl Into<String>,
        timestamp: impl Into<String>,
        outcome: &RepairOutcome,
    ) -> Self {
        Self::new(
            implementation,
            timestamp,
            CategoryKind::Repair,
            serde_json::to_value(outcome).unwrap_or(serde_json::Value::Null),
        )
    }

    /// Parse `timestamp` as RFC 3339, falling back to a zone-less
    /// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` reading in UTC.
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(ts);
        }
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&self.timestamp, fmt).ok())
            .map(|naive| naive.and_utc().fixed_offset())
    }
}

/// Typed view of a throughput outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputOutcome {
    pub execution_time: Option<f64>,
}

/// Typed view of a repair outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub tests_passed: u64,
    pub total_tests: u64,
    pub success: bool,
    pub execution_time: f64,
    pub syntax_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A single metric value, tagged by field kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Numeric(f64),
    Boolean(bool),
}

/// Repair-only metric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairMetrics {
    pub tests_passed: u64,
    pub total_tests: u64,
    /// `tests_passed / total_tests`, 0 when `total_tests == 0`. Always in `[0, 1]`.
    pub success_rate: f64,
    pub syntax_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Set when this record is the canonical failure substituted for an
    /// unparsable outcome.
    #[serde(default)]
    pub malformed: bool,
}

/// Category-specific part of [`NormalizedMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum MetricDetail {
    Throughput,
    Repair(RepairMetrics),
}

/// Category-uniform projection of one [`RawRunRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetrics {
    /// Lower is better for throughput (seconds), higher is better for repair
    /// (success rate).
    pub primary_metric: f64,
    pub success: bool,
    pub execution_time: f64,
    pub detail: MetricDetail,
}

impl NormalizedMetrics {
    /// The all-zero record that stands in for an unparsable repair outcome.
    pub fn repair_failure(reason: impl Into<String>) -> Self {
        Self {
            primary_metric: 0.0,
            success: false,
            execution_time: 0.0,
            detail: MetricDetail::Repair(RepairMetrics {
                tests_passed: 0,
                total_tests: 0,
                success_rate: 0.0,
                syntax_valid: false,
                error_message: Some(reason.into()),
                malformed: true,
            }),
        }
    }

    pub fn category(&self) -> CategoryKind {
        match self.detail {
            MetricDetail::Throughput => CategoryKind::Throughput,
            MetricDetail::Repair(_) => CategoryKind::Repair,
        }
    }

    pub fn repair(&self) -> Option<&RepairMetrics> {
        match &self.detail {
            MetricDetail::Repair(r) => Some(r),
            MetricDetail::Throughput => None,
        }
    }

    /// Success rate for repair records, `None` for throughput.
    pub fn success_rate(&self) -> Option<f64> {
        self.repair().map(|r| r.success_rate)
    }

    pub fn is_malformed(&self) -> bool {
        self.repair().is_some_and(|r| r.malformed)
    }

    /// Look up a metric field by name. `None` when the field does not exist
    /// for this record's category.
    pub fn field(&self, name: &str) -> Option<MetricValue> {
        use MetricValue::{Boolean, Numeric};

        match name {
            "primary_metric" => return Some(Numeric(self.primary_metric)),
            "execution_time" => return Some(Numeric(self.execution_time)),
            "success" => return Some(Boolean(self.success)),
            _ => {}
        }
        let r = self.repair()?;
        match name {
            "success_rate" => Some(Numeric(r.success_rate)),
            "tests_passed" => Some(Numeric(r.tests_passed as f64)),
            "total_tests" => Some(Numeric(r.total_tests as f64)),
            "syntax_valid" => Some(Boolean(r.syntax_valid)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput_constructor_shapes_outcome() {
        let run = RawRunRecord::throughput("a", "2024-05-01T10:00:00Z", 0.25);
        assert_eq!(run.category, CategoryKind::Throughput);
        assert_eq!(run.raw_outcome["execution_time"], serde_json::json!(0.25));
    }

    #[test]
    fn test_nan_time_becomes_null() {
        let run = RawRunRecord::throughput("a", "t", f64::NAN);
        assert!(run.raw_outcome["execution_time"].is_null());
    }

    #[test]
    fn test_missing_outcome_deserializes_as_null() {
        let run: RawRunRecord = serde_json::from_str(
            r#"{"implementation": "a", "timestamp": "t", "category": "repair"}"#,
        )
        .expect("deserialize");
        assert!(run.raw_outcome.is_null());
    }

    #[test]
    fn test_parsed_timestamp_formats() {
        let rfc = RawRunRecord::throughput("a", "2024-05-01T10:00:00+02:00", 1.0);
        assert!(rfc.parsed_timestamp().is_some());

        let naive = RawRunRecord::throughput("a", "2024-05-01 10:00:00", 1.0);
        assert!(naive.parsed_timestamp().is_some());

        let garbage = RawRunRecord::throughput("a", "yesterday", 1.0);
        assert!(garbage.parsed_timestamp().is_none());
    }

    #[test]
    fn test_repair_failure_is_all_zero() {
        let m = NormalizedMetrics::repair_failure("not an object");
        assert_eq!(m.primary_metric, 0.0);
        assert!(!m.success);
        assert_eq!(m.execution_time, 0.0);
        assert_eq!(m.success_rate(), Some(0.0));
        assert!(m.is_malformed());
        let r = m.repair().expect("repair detail");
        assert_eq!(r.tests_passed, 0);
        assert_eq!(r.total_tests, 0);
    }

    #[test]
    fn test_field_lookup_respects_category() {
        let t = NormalizedMetrics {
            primary_metric: 0.5,
            success: true,
            execution_time: 0.5,
            detail: MetricDetail::Throughput,
        };
        assert_eq!(t.field("execution_time"), Some(MetricValue::Numeric(0.5)));
        assert_eq!(t.field("success"), Some(MetricValue::Boolean(true)));
        assert_eq!(t.field("success_rate"), None);

        let r = NormalizedMetrics::repair_failure("x");
        assert_eq!(r.field("tests_passed"), Some(MetricValue::Numeric(0.0)));
        assert_eq!(r.field("syntax_valid"), Some(MetricValue::Boolean(false)));
        assert_eq!(r.field("nonexistent"), None);
    }

    #[test]
    fn test_repair_outcome_roundtrip_through_record() {
        let outcome = RepairOutcome {
            tests_passed: 3,
            total_tests: 4,
            success: true,
            execution_time: 0.2,
            syntax_valid: true,
            error_message: None,
        };
        let run = RawRunRecord::repair("a", "t", &outcome);
        let back: RepairOutcome = serde_json::from_value(run.raw_outcome).expect("deserialize");
        assert_eq!(back, outcome);
    }
}
