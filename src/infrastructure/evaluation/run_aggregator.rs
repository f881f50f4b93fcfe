use std::sync::Arc;

use chrono::Utc;
use futures::future::{self, join_all};
use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::evaluation::{ConfigSnapshot, QuestionOutcome, RunError, RunSummary};
use crate::domain::question::{QuestionRecord, QuestionSet};
use crate::domain::retrieval::Retriever;
use crate::domain::scoring::{EvalErrorKind, ScoreEntry, Scorer, ScoringInput, StageFailure};
use crate::infrastructure::generation::RagGenerator;
use crate::infrastructure::observability;

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Settings for one evaluation invocation; nothing is shared across runs
/// except what is passed in here
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub max_concurrency: usize,
    pub snapshot: ConfigSnapshot,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            snapshot: ConfigSnapshot {
                max_concurrency: DEFAULT_MAX_CONCURRENCY,
                ..Default::default()
            },
        }
    }
}

impl EvalConfig {
    pub fn new(max_concurrency: usize, snapshot: ConfigSnapshot) -> Self {
        Self {
            max_concurrency,
            snapshot,
        }
    }
}

/// Everything produced for one question, merged into the summary after
/// the question completes
#[derive(Debug)]
struct QuestionResult {
    outcome: QuestionOutcome,
    entries: Vec<ScoreEntry>,
    retrieval_failure: Option<StageFailure>,
}

/// Drives retrieval, generation and scoring over a question set
#[derive(Debug, Clone)]
pub struct RunAggregator {
    retriever: Arc<dyn Retriever>,
    generator: Arc<RagGenerator>,
    scorers: Vec<Arc<dyn Scorer>>,
    config: EvalConfig,
}

impl RunAggregator {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<RagGenerator>,
        scorers: Vec<Arc<dyn Scorer>>,
        config: EvalConfig,
    ) -> Self {
        Self {
            retriever,
            generator,
            scorers,
            config,
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate every question with at most `max_concurrency` in flight
    ///
    /// Once `cancel` fires no new question is dispatched; questions already
    /// in flight finish and the partial summary is returned marked cancelled.
    pub async fn run(
        &self,
        questions: &QuestionSet,
        run_name: &str,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, RunError> {
        if questions.is_empty() {
            return Err(RunError::EmptyQuestionSet);
        }

        let started_at = Utc::now();
        let concurrency = self.config.max_concurrency.max(1);

        info!(
            run_name = %run_name,
            questions = questions.len(),
            concurrency,
            provider = %self.generator.provider_name(),
            "Starting evaluation run"
        );

        let mut results: Vec<(usize, QuestionResult)> = stream::iter(questions.iter().enumerate())
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|(index, question)| async move { (index, self.evaluate(question).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);

        if let Some(message) = retriever_unavailable(&results) {
            return Err(RunError::RetrieverUnavailable { message });
        }

        let mut outcomes = Vec::with_capacity(results.len());
        let mut entries = Vec::with_capacity(results.len() * self.scorers.len());
        for (_, result) in results {
            outcomes.push(result.outcome);
            entries.extend(result.entries);
        }

        let mut summary = RunSummary::new(
            run_name,
            started_at,
            questions.len(),
            outcomes,
            entries,
            self.config.snapshot.clone(),
        );

        if cancel.is_cancelled() {
            warn!(
                run_name = %run_name,
                skipped = summary.skipped,
                "Run cancelled; summary is partial"
            );
            summary = summary.mark_cancelled();
        }

        for axis in &summary.axes {
            info!(
                run_name = %run_name,
                axis = %axis.axis,
                mean = ?axis.mean,
                scored = axis.scored,
                excluded = axis.excluded,
                failed = axis.failed,
                "Axis summary"
            );
        }

        Ok(summary)
    }

    async fn evaluate(&self, question: &QuestionRecord) -> QuestionResult {
        let start = Instant::now();

        let retrieval = self.retriever.retrieve(question).await.map_err(|e| {
            warn!(question_id = %question.id, error = %e, "Retrieval failed");
            StageFailure::new(EvalErrorKind::RetrievalFailure, e.to_string())
        });

        let generation = self
            .generator
            .generate(question, retrieval.as_ref().ok())
            .await
            .map_err(|e| {
                warn!(
                    question_id = %question.id,
                    retries = e.retry_count(),
                    error = %e,
                    "Generation failed"
                );
                StageFailure::new(e.kind(), format!("{} ({} retries)", e, e.retry_count()))
            });

        let input = ScoringInput::new(question, retrieval.as_ref(), generation.as_ref());
        let entries = join_all(self.scorers.iter().map(|scorer| scorer.score(input))).await;

        for entry in &entries {
            if let Some(kind) = entry.error() {
                observability::record_axis_failure(entry.axis, kind);
            }
        }

        let elapsed = start.elapsed();
        observability::record_question_duration(elapsed);

        debug!(
            question_id = %question.id,
            duration_ms = elapsed.as_millis() as u64,
            "Question evaluated"
        );

        let (retrieval, retrieval_failure) = match retrieval {
            Ok(result) => (Some(result), None),
            Err(failure) => (None, Some(failure)),
        };

        QuestionResult {
            outcome: QuestionOutcome {
                question_id: question.id.clone(),
                retrieval,
                generation: generation.ok(),
                duration_ms: elapsed.as_millis() as u64,
            },
            entries,
            retrieval_failure,
        }
    }
}

/// A run where no question could be retrieved is a run against a dead
/// retriever, not a low score
fn retriever_unavailable(results: &[(usize, QuestionResult)]) -> Option<String> {
    if results.is_empty() {
        return None;
    }

    let mut last = None;
    for (_, result) in results {
        match &result.retrieval_failure {
            Some(failure) if failure.kind == EvalErrorKind::RetrievalFailure => {
                last = Some(failure.message.clone());
            }
            _ => return None,
        }
    }

    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::judge::MockJudge;
    use crate::domain::llm::{LlmProvider, LlmRequest, LlmResponse, MockFailure, MockLlmProvider};
    use crate::domain::resilience::RetryPolicy;
    use crate::domain::retrieval::{MockRetriever, RetrievedDocument};
    use crate::domain::scoring::{Axis, AxisOutcome};
    use crate::domain::DomainError;
    use crate::infrastructure::llm::ResolvedProvider;
    use crate::infrastructure::resilience::ResilientCaller;
    use crate::infrastructure::retrieval::FixtureRetriever;
    use crate::infrastructure::scoring::{FactualityScorer, ReasoningScorer, RetrievalRecallScorer};

    fn caller() -> Arc<ResilientCaller> {
        let policy = RetryPolicy::new(3)
            .with_initial_delay(100)
            .with_max_delay(1_000)
            .with_jitter(0)
            .with_attempt_timeout(None);
        Arc::new(ResilientCaller::with_seed(policy, 11))
    }

    fn question_set() -> QuestionSet {
        let questions = (1..=5)
            .map(|i| {
                QuestionRecord::new(format!("q{}", i), format!("Question number {}", i))
                    .with_reference_doc(format!("doc-{}", i))
                    .with_required_keywords(["paris"])
            })
            .collect();
        QuestionSet::new(questions).unwrap()
    }

    fn fixture_retriever() -> FixtureRetriever {
        (1..=5).fold(FixtureRetriever::new(), |retriever, i| {
            retriever.with_documents(
                format!("q{}", i),
                vec![RetrievedDocument::new(format!("doc-{}", i), "Paris is in France")],
            )
        })
    }

    /// Cancels the run as soon as its first completion returns
    #[derive(Debug)]
    struct CancelAfterFirstCall {
        inner: MockLlmProvider,
        cancel: CancellationToken,
    }

    #[async_trait::async_trait]
    impl LlmProvider for CancelAfterFirstCall {
        async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
            let response = self.inner.chat(model, request).await;
            self.cancel.cancel();
            response
        }

        fn provider_name(&self) -> &'static str {
            self.inner.provider_name()
        }
    }

    fn aggregator(retriever: Arc<dyn Retriever>, llm: MockLlmProvider) -> RunAggregator {
        aggregator_with(retriever, Arc::new(llm), 2)
    }

    fn aggregator_with(
        retriever: Arc<dyn Retriever>,
        provider: Arc<dyn LlmProvider>,
        max_concurrency: usize,
    ) -> RunAggregator {
        let caller = caller();
        let generator = RagGenerator::new(
            ResolvedProvider {
                name: "mock".to_string(),
                model: "mock-model".to_string(),
                provider,
            },
            caller.clone(),
        );

        let judge = Arc::new(MockJudge::new().with_fixed_verdict(0.8, 0.6));
        let scorers: Vec<Arc<dyn Scorer>> = vec![
            Arc::new(RetrievalRecallScorer::new()),
            Arc::new(FactualityScorer::new()),
            Arc::new(ReasoningScorer::new(judge, caller)),
        ];

        RunAggregator::new(
            retriever,
            Arc::new(generator),
            scorers,
            EvalConfig::new(max_concurrency, ConfigSnapshot::default()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_rate_limited_generation_only_fails_downstream_axes() {
        let llm = MockLlmProvider::new("mock")
            .with_response("It is Paris.")
            .always_failing_for("Question number 3", MockFailure::RateLimit);
        let aggregator = aggregator(Arc::new(fixture_retriever()), llm);

        let summary = aggregator
            .run(&question_set(), "e2e", &CancellationToken::new())
            .await
            .unwrap();

        assert!(!summary.cancelled);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.entries_for(Axis::Retrieval).len(), 5);
        assert_eq!(summary.failure_count(Axis::Retrieval), 0);
        assert_eq!(summary.failure_count(Axis::Factuality), 1);
        assert_eq!(summary.failure_count(Axis::Reasoning), 1);

        let factuality = summary.axis(Axis::Factuality).unwrap();
        assert_eq!(factuality.scored, 4);
        assert_eq!(factuality.mean, Some(1.0));
        assert_eq!(
            factuality.failures_by_kind.get(&EvalErrorKind::RateLimitExceeded),
            Some(&1)
        );

        let failed = &summary.entries_for(Axis::Reasoning)[2];
        assert_eq!(failed.question_id, "q3");
        assert_eq!(failed.error(), Some(EvalErrorKind::RateLimitExceeded));
        match &summary.entries_for(Axis::Factuality)[2].outcome {
            AxisOutcome::Failed { message, .. } => assert!(message.ends_with("(2 retries)")),
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(summary.axis_mean(Axis::Retrieval), Some(1.0));
        assert!((summary.axis_mean(Axis::Reasoning).unwrap() - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_outcomes_keep_question_set_order() {
        let llm = MockLlmProvider::new("mock").with_response("Paris");
        let aggregator = aggregator(Arc::new(fixture_retriever()), llm);

        let summary = aggregator
            .run(&question_set(), "order", &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<&str> = summary
            .outcomes
            .iter()
            .map(|o| o.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4", "q5"]);
    }

    #[tokio::test]
    async fn test_single_retrieval_failure_still_generates() {
        let retriever = (1..=4).fold(FixtureRetriever::new(), |acc, i| {
            acc.with_documents(
                format!("q{}", i),
                vec![RetrievedDocument::new(format!("doc-{}", i), "Paris")],
            )
        });
        let llm = MockLlmProvider::new("mock").with_response("Paris");
        let aggregator = aggregator(Arc::new(retriever), llm);

        let summary = aggregator
            .run(&question_set(), "partial", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.failure_count(Axis::Retrieval), 1);
        assert_eq!(
            summary.entries_for(Axis::Retrieval)[4].error(),
            Some(EvalErrorKind::RetrievalFailure)
        );
        assert_eq!(summary.failure_count(Axis::Factuality), 0);
        assert!(summary.outcomes[4].generation.is_some());
        assert!(summary.outcomes[4].retrieval.is_none());
    }

    #[tokio::test]
    async fn test_every_retrieval_failing_is_fatal() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .returning(|_| Err(DomainError::retrieval("connection refused")));
        retriever.expect_retriever_name().return_const("mock");

        let llm = MockLlmProvider::new("mock").with_response("Paris");
        let aggregator = aggregator(Arc::new(retriever), llm);

        let err = aggregator
            .run(&question_set(), "dead", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::RetrieverUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_empty_question_set_is_fatal() {
        let llm = MockLlmProvider::new("mock").with_response("Paris");
        let aggregator = aggregator(Arc::new(fixture_retriever()), llm);
        let empty = QuestionSet::new(vec![]).unwrap();

        let err = aggregator
            .run(&empty, "empty", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::EmptyQuestionSet));
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch_skips_everything() {
        let llm = MockLlmProvider::new("mock").with_response("Paris");
        let aggregator = aggregator(Arc::new(fixture_retriever()), llm);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = aggregator.run(&question_set(), "cancelled", &cancel).await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.skipped, 5);
        assert_eq!(summary.question_count, 5);
        assert!(summary.outcomes.is_empty());
        assert_eq!(summary.axis_mean(Axis::Retrieval), None);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_finishes_in_flight_and_skips_the_rest() {
        let cancel = CancellationToken::new();
        let provider = Arc::new(CancelAfterFirstCall {
            inner: MockLlmProvider::new("mock").with_response("Paris"),
            cancel: cancel.clone(),
        });
        let aggregator = aggregator_with(Arc::new(fixture_retriever()), provider, 1);

        let summary = aggregator.run(&question_set(), "interrupted", &cancel).await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.outcomes[0].question_id, "q1");
        assert_eq!(summary.skipped, 4);
        assert_eq!(
            summary.outcomes.len() + summary.skipped,
            summary.question_count
        );
        assert_eq!(summary.entries_for(Axis::Factuality).len(), 1);
        assert_eq!(summary.axis_mean(Axis::Factuality), Some(1.0));
        assert!((summary.axis_mean(Axis::Reasoning).unwrap() - 0.7).abs() < 1e-9);
    }
}
