use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::ranking::BenchmarkReport;

/// Schema identifier written into every report artifact.
pub const REPORT_SCHEMA_VERSION: &str = "benchscore.report.v1";

/// Ranked aggregate output persisted for reporting layers.
///
/// `report_digest` covers the rankings only, not `generated_at`, so two
/// reports built from the same runs carry the same digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub report_digest: String,
    #[serde(flatten)]
    pub report: BenchmarkReport,
}

impl ReportArtifact {
    pub fn new(report: BenchmarkReport, generated_at: DateTime<Utc>) -> Result<Self> {
        let report_digest = report_digest(&report)?;
        Ok(Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at,
            report_digest,
            report,
        })
    }

    /// Recompute the digest and compare it with the stored one.
    pub fn verify(&self) -> Result<()> {
        let actual = report_digest(&self.report)?;
        if actual != self.report_digest {
            bail!(
                "report digest mismatch: expected {}, got {}",
                self.report_digest,
                actual
            );
        }
        Ok(())
    }
}

/// SHA-256 hex digest of the report's canonical JSON encoding.
pub fn report_digest(report: &BenchmarkReport) -> Result<String> {
    let bytes = serde_json::to_vec(report).context("serialize report for digest")?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Write the report artifact in pretty JSON format.
pub fn write_report_json(path: &Path, artifact: &ReportArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize report artifact")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Read a report artifact and verify its digest.
pub fn read_report_json(path: &Path) -> Result<ReportArtifact> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    let artifact: ReportArtifact =
        serde_json::from_str(&content).context("deserialize report artifact")?;
    artifact.verify()?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryKind, RawRunRecord};
    use crate::ranking::{RankingSelector, RunSet};
    use crate::registry::CategoryRegistry;

    fn sample_report() -> BenchmarkReport {
        let registry = CategoryRegistry::new().register("fib", CategoryKind::Throughput);
        let mut run_set = RunSet::new();
        run_set.insert(
            "fib".to_string(),
            vec![
                RawRunRecord::throughput("a", "2024-05-01T10:00:00Z", 0.1),
                RawRunRecord::throughput("b", "2024-05-01T10:00:01Z", 0.3),
            ],
        );
        RankingSelector::new(&registry).build_report(&run_set)
    }

    #[test]
    fn test_digest_ignores_generated_at() {
        let a = ReportArtifact::new(sample_report(), Utc::now()).expect("artifact");
        let b = ReportArtifact::new(
            sample_report(),
            DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z")
                .expect("ts")
                .with_timezone(&Utc),
        )
        .expect("artifact");
        assert_eq!(a.report_digest, b.report_digest);
        assert_eq!(a.report_digest.len(), 64);
    }

    #[test]
    fn test_verify_detects_tampering() {
        let mut artifact = ReportArtifact::new(sample_report(), Utc::now()).expect("artifact");
        assert!(artifact.verify().is_ok());
        if let Some(ranking) = artifact.report.tasks.get_mut("fib") {
            ranking.ranked[0].aggregate.score = 1.0;
        }
        assert!(artifact.verify().is_err());
    }
}
