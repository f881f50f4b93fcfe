//! Domain layer - Core evaluation entities and traits

pub mod error;
pub mod evaluation;
pub mod generation;
pub mod judge;
pub mod llm;
pub mod question;
pub mod resilience;
pub mod retrieval;
pub mod scoring;

pub use error::DomainError;
pub use evaluation::{
    AxisContribution, AxisSummary, ConfigSnapshot, EvaluationReport, EvaluationSummary, Grade,
    GradingThresholds, QuestionOutcome, ReconcileError, ReconciledAxis, ReconciledSummary,
    RqiReport, RqiWeights, RunError, RunSummary, SummarySource,
};
pub use generation::GenerationResult;
pub use judge::{Judge, JudgeRequest, JudgeVerdict, ReasoningWeights};
pub use llm::{LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole, Usage};
pub use question::{QuestionRecord, QuestionSet};
pub use resilience::{CallError, CallOutcome, FailureKind, RetryPolicy};
pub use retrieval::{RetrievalResult, RetrievedDocument, Retriever};
pub use scoring::{
    Axis, AxisOutcome, EvalErrorKind, Evidence, ScoreEntry, Scorer, ScoringInput, StageFailure,
};
