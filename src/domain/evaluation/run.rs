use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::generation::GenerationResult;
use crate::domain::judge::ReasoningWeights;
use crate::domain::resilience::RetryPolicy;
use crate::domain::retrieval::RetrievalResult;
use crate::domain::scoring::{Axis, EvalErrorKind, ScoreEntry};

/// Provider and pipeline settings a run was produced with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub provider: String,
    pub model: String,
    pub judge_provider: String,
    pub judge_model: String,
    pub retriever: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_set: Option<String>,
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
    pub reasoning_weights: ReasoningWeights,
}

/// Pipeline artifacts for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval: Option<RetrievalResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationResult>,
    pub duration_ms: u64,
}

/// Per-axis statistics for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSummary {
    pub axis: Axis,
    /// Mean over scored entries; `None` when no entry was scored
    pub mean: Option<f64>,
    pub scored: usize,
    pub excluded: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures_by_kind: BTreeMap<EvalErrorKind, usize>,
}

impl AxisSummary {
    pub fn from_entries<'a>(axis: Axis, entries: impl IntoIterator<Item = &'a ScoreEntry>) -> Self {
        let mut sum = 0.0;
        let mut scored = 0;
        let mut excluded = 0;
        let mut failed = 0;
        let mut failures_by_kind = BTreeMap::new();

        for entry in entries.into_iter().filter(|e| e.axis == axis) {
            if let Some(score) = entry.score() {
                sum += score;
                scored += 1;
            } else if let Some(kind) = entry.error() {
                failed += 1;
                *failures_by_kind.entry(kind).or_insert(0) += 1;
            } else {
                excluded += 1;
            }
        }

        let mean = if scored > 0 {
            Some(sum / scored as f64)
        } else {
            None
        };

        Self {
            axis,
            mean,
            scored,
            excluded,
            failed,
            failures_by_kind,
        }
    }

    pub fn has_data(&self) -> bool {
        self.mean.is_some()
    }
}

/// One complete pass over the question set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub run_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Questions in the set, dispatched or not
    pub question_count: usize,
    /// Questions never dispatched because the run was cancelled
    pub skipped: usize,
    pub cancelled: bool,
    pub axes: Vec<AxisSummary>,
    pub entries: BTreeMap<Axis, Vec<ScoreEntry>>,
    pub outcomes: Vec<QuestionOutcome>,
    pub config: ConfigSnapshot,
}

impl RunSummary {
    /// Assemble a summary from independently produced per-question results
    pub fn new(
        run_name: impl Into<String>,
        started_at: DateTime<Utc>,
        question_count: usize,
        outcomes: Vec<QuestionOutcome>,
        entries: Vec<ScoreEntry>,
        config: ConfigSnapshot,
    ) -> Self {
        let axes = Axis::ALL
            .iter()
            .map(|axis| AxisSummary::from_entries(*axis, &entries))
            .collect();

        let mut by_axis: BTreeMap<Axis, Vec<ScoreEntry>> =
            Axis::ALL.iter().map(|axis| (*axis, Vec::new())).collect();
        for entry in entries {
            by_axis.entry(entry.axis).or_default().push(entry);
        }

        let skipped = question_count.saturating_sub(outcomes.len());

        Self {
            run_id: Uuid::new_v4(),
            run_name: run_name.into(),
            started_at,
            finished_at: Utc::now(),
            question_count,
            skipped,
            cancelled: false,
            axes,
            entries: by_axis,
            outcomes,
            config,
        }
    }

    pub fn mark_cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    pub fn axis(&self, axis: Axis) -> Option<&AxisSummary> {
        self.axes.iter().find(|a| a.axis == axis)
    }

    pub fn axis_mean(&self, axis: Axis) -> Option<f64> {
        self.axis(axis).and_then(|a| a.mean)
    }

    pub fn failure_count(&self, axis: Axis) -> usize {
        self.axis(axis).map(|a| a.failed).unwrap_or(0)
    }

    pub fn entries_for(&self, axis: Axis) -> &[ScoreEntry] {
        self.entries.get(&axis).map(Vec::as_slice).unwrap_or(&[])
    }
}
