use thiserror::Error;

/// Run-level failures; these abort the run and no report is produced
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Question set is empty")]
    EmptyQuestionSet,

    #[error("Retriever unavailable: every retrieval failed ({message})")]
    RetrieverUnavailable { message: String },

    #[error("Invalid run configuration: {message}")]
    InvalidConfig { message: String },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Reconciliation needs at least 2 runs, got {count}")]
    NotEnoughRuns { count: usize },
}
