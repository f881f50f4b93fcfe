use std::fmt::Debug;

use async_trait::async_trait;

use super::{Axis, EvalErrorKind, ScoreEntry};
use crate::domain::generation::GenerationResult;
use crate::domain::question::QuestionRecord;
use crate::domain::retrieval::RetrievalResult;

/// Why an upstream pipeline stage produced nothing
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub kind: EvalErrorKind,
    pub message: String,
}

impl StageFailure {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything the pipeline produced for one question
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub question: &'a QuestionRecord,
    pub retrieval: Result<&'a RetrievalResult, &'a StageFailure>,
    pub generation: Result<&'a GenerationResult, &'a StageFailure>,
}

impl<'a> ScoringInput<'a> {
    pub fn new(
        question: &'a QuestionRecord,
        retrieval: Result<&'a RetrievalResult, &'a StageFailure>,
        generation: Result<&'a GenerationResult, &'a StageFailure>,
    ) -> Self {
        Self {
            question,
            retrieval,
            generation,
        }
    }
}

/// One scoring strategy, bound to one axis
///
/// Implementations check applicability first: an inapplicable question is
/// `Excluded` even when an upstream stage failed.
#[async_trait]
pub trait Scorer: Send + Sync + Debug {
    fn axis(&self) -> Axis;

    async fn score(&self, input: ScoringInput<'_>) -> ScoreEntry;
}
