//! Evaluation domain: run summaries, multi-run reconciliation and the
//! RAG Quality Index report.

mod error;
mod reconciled;
mod report;
mod rqi;
mod run;

pub use error::{ReconcileError, RunError};
pub use reconciled::{ReconciledAxis, ReconciledSummary, RECOMMENDED_MIN_RUNS};
pub use report::{EvaluationReport, REPORT_FORMAT_VERSION};
pub use rqi::{
    AxisContribution, EvaluationSummary, Grade, GradingThresholds, RqiReport,
    RqiWeights, SummarySource,
};
pub use run::{AxisSummary, ConfigSnapshot, QuestionOutcome, RunSummary};
