use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConfigSnapshot, ReconciledSummary, RqiReport, RunSummary};
use crate::domain::scoring::Axis;

pub const REPORT_FORMAT_VERSION: u32 = 1;

/// Persisted artifact of one `run` invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub format_version: u32,
    pub run_name: String,
    pub generated_at: DateTime<Utc>,
    pub config: ConfigSnapshot,
    /// Failed entries per axis, summed over every run
    pub failures: BTreeMap<Axis, usize>,
    /// Questions never dispatched, summed over every run
    pub skipped: usize,
    pub cancelled: bool,
    pub rqi: RqiReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciled: Option<ReconciledSummary>,
    pub runs: Vec<RunSummary>,
}

impl EvaluationReport {
    pub fn new(
        run_name: impl Into<String>,
        runs: Vec<RunSummary>,
        reconciled: Option<ReconciledSummary>,
        rqi: RqiReport,
    ) -> Self {
        let failures = Axis::ALL
            .iter()
            .map(|axis| (*axis, runs.iter().map(|r| r.failure_count(*axis)).sum()))
            .collect();

        Self {
            format_version: REPORT_FORMAT_VERSION,
            run_name: run_name.into(),
            generated_at: Utc::now(),
            config: runs.first().map(|r| r.config.clone()).unwrap_or_default(),
            failures,
            skipped: runs.iter().map(|r| r.skipped).sum(),
            cancelled: runs.iter().any(|r| r.cancelled),
            rqi,
            reconciled,
            runs,
        }
    }

    pub fn failure_count(&self, axis: Axis) -> usize {
        self.failures.get(&axis).copied().unwrap_or(0)
    }

    pub fn axis_mean(&self, axis: Axis) -> Option<f64> {
        self.rqi.contribution(axis).and_then(|c| c.mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evaluation::{Grade, SummarySource};
    use crate::domain::scoring::{EvalErrorKind, ScoreEntry};

    #[test]
    fn test_failures_are_summed_across_runs() {
        let run = |failed: usize| {
            let entries = (0..failed)
                .map(|i| {
                    ScoreEntry::failed(
                        Axis::Reasoning,
                        format!("q{}", i),
                        EvalErrorKind::RateLimitExceeded,
                        "exhausted",
                    )
                })
                .collect();
            RunSummary::new("r", Utc::now(), 3, vec![], entries, ConfigSnapshot::default())
        };
        let rqi = RqiReport {
            rqi: None,
            grade: Grade::NoData,
            contributions: vec![],
            bottleneck: None,
            justification: vec![],
            source: SummarySource::Reconciled { run_ids: vec![] },
        };

        let report = EvaluationReport::new("r", vec![run(1), run(2)], None, rqi);

        assert_eq!(report.failure_count(Axis::Reasoning), 3);
        assert_eq!(report.failure_count(Axis::Retrieval), 0);
        assert_eq!(report.skipped, 6);
        assert!(!report.cancelled);
        assert_eq!(report.axis_mean(Axis::Reasoning), None);
    }
}
