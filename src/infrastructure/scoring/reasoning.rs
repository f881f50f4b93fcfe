use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::judge::{Judge, JudgeRequest, ReasoningWeights};
use crate::domain::scoring::{Axis, Evidence, ScoreEntry, Scorer, ScoringInput};
use crate::infrastructure::resilience::ResilientCaller;

/// Judge-assessed answer quality, through the resilient caller
///
/// A judge call that fails is recorded as `Failed` and left out of the
/// axis mean; it never turns into a default score.
#[derive(Debug)]
pub struct ReasoningScorer {
    judge: Arc<dyn Judge>,
    caller: Arc<ResilientCaller>,
    weights: ReasoningWeights,
}

impl ReasoningScorer {
    pub fn new(judge: Arc<dyn Judge>, caller: Arc<ResilientCaller>) -> Self {
        Self {
            judge,
            caller,
            weights: ReasoningWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: ReasoningWeights) -> Self {
        self.weights = weights;
        self
    }
}

#[async_trait]
impl Scorer for ReasoningScorer {
    fn axis(&self) -> Axis {
        Axis::Reasoning
    }

    async fn score(&self, input: ScoringInput<'_>) -> ScoreEntry {
        let question = input.question;

        let generation = match input.generation {
            Ok(generation) => generation,
            Err(failure) => {
                return ScoreEntry::failed(
                    Axis::Reasoning,
                    &question.id,
                    failure.kind,
                    failure.message.clone(),
                );
            }
        };

        let request = JudgeRequest {
            question_id: question.id.clone(),
            question: question.question.clone(),
            answer: generation.answer.clone(),
            contexts: input
                .retrieval
                .map(|retrieval| retrieval.contexts())
                .unwrap_or_default(),
            golden_answer: question.golden_answer.clone(),
        };

        let judge = &self.judge;
        let request = &request;

        match self
            .caller
            .invoke("judge", || async move { judge.judge(request).await })
            .await
        {
            Ok(outcome) => {
                let verdict = outcome.value;
                let score = self.weights.combine(&verdict);

                ScoreEntry::scored(
                    Axis::Reasoning,
                    &question.id,
                    score,
                    Evidence::Judge {
                        faithfulness: verdict.faithfulness,
                        relevancy: verdict.relevancy,
                        explanation: verdict.explanation,
                        retry_count: outcome.retry_count,
                    },
                )
            }
            Err(error) => {
                ScoreEntry::failed(Axis::Reasoning, &question.id, error.kind(), error.to_string())
            }
        }
    }
}
