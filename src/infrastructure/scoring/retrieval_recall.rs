use async_trait::async_trait;

use crate::domain::scoring::{Axis, EvalErrorKind, Evidence, ScoreEntry, Scorer, ScoringInput};

/// Binary recall: did any reference document make it into the retrieved set
///
/// Rank position is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievalRecallScorer;

impl RetrievalRecallScorer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scorer for RetrievalRecallScorer {
    fn axis(&self) -> Axis {
        Axis::Retrieval
    }

    async fn score(&self, input: ScoringInput<'_>) -> ScoreEntry {
        let question = input.question;

        if !question.has_reference_docs() {
            return ScoreEntry::excluded(Axis::Retrieval, &question.id, "no reference document ids");
        }

        let retrieval = match input.retrieval {
            Ok(retrieval) => retrieval,
            Err(failure) => {
                return ScoreEntry::failed(
                    Axis::Retrieval,
                    &question.id,
                    failure.kind,
                    failure.message.clone(),
                );
            }
        };

        if retrieval.question_id != question.id {
            return ScoreEntry::failed(
                Axis::Retrieval,
                &question.id,
                EvalErrorKind::ScoringError,
                format!(
                    "retrieval result belongs to question '{}'",
                    retrieval.question_id
                ),
            );
        }

        let matched: Vec<String> = question
            .reference_doc_ids
            .iter()
            .filter(|id| retrieval.contains_document(id))
            .cloned()
            .collect();

        let score = if matched.is_empty() { 0.0 } else { 1.0 };

        ScoreEntry::scored(
            Axis::Retrieval,
            &question.id,
            score,
            Evidence::Recall {
                expected: question.reference_doc_ids.clone(),
                matched,
                retrieved: retrieval
                    .document_ids()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::question::QuestionRecord;
    use crate::domain::scoring::StageFailure;
    use crate::infrastructure::scoring::test_support::{generation, retrieval};

    fn no_generation() -> StageFailure {
        StageFailure::new(EvalErrorKind::RateLimitExceeded, "not generated")
    }

    #[tokio::test]
    async fn test_reference_found_at_any_rank_scores_one() {
        let question = QuestionRecord::new("q1", "?").with_reference_doc("doc-3");
        let gen_failure = no_generation();

        for ids in [
            vec!["doc-3", "doc-1", "doc-2"],
            vec!["doc-1", "doc-2", "doc-3"],
            vec!["doc-2", "doc-3", "doc-1"],
        ] {
            let result = retrieval("q1", &ids);
            let entry = RetrievalRecallScorer
                .score(ScoringInput::new(&question, Ok(&result), Err(&gen_failure)))
                .await;

            assert_eq!(entry.score(), Some(1.0));
        }
    }

    #[tokio::test]
    async fn test_missing_reference_scores_zero() {
        let question = QuestionRecord::new("q1", "?").with_reference_doc("doc-9");
        let result = retrieval("q1", &["doc-1", "doc-2"]);
        let answer = generation("q1", "x");

        let entry = RetrievalRecallScorer
            .score(ScoringInput::new(&question, Ok(&result), Ok(&answer)))
            .await;

        assert_eq!(entry.score(), Some(0.0));
        match entry.evidence() {
            Some(Evidence::Recall { matched, retrieved, .. }) => {
                assert!(matched.is_empty());
                assert_eq!(retrieved, &vec!["doc-1".to_string(), "doc-2".to_string()]);
            }
            other => panic!("unexpected evidence: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_any_of_several_references_counts() {
        let question = QuestionRecord::new("q1", "?")
            .with_reference_doc("a")
            .with_reference_doc("b");
        let result = retrieval("q1", &["x", "b"]);
        let answer = generation("q1", "x");

        let entry = RetrievalRecallScorer
            .score(ScoringInput::new(&question, Ok(&result), Ok(&answer)))
            .await;

        assert_eq!(entry.score(), Some(1.0));
    }

    #[tokio::test]
    async fn test_no_reference_is_excluded_even_if_retrieval_failed() {
        let question = QuestionRecord::new("q1", "?");
        let failure = StageFailure::new(EvalErrorKind::RetrievalFailure, "down");
        let answer = generation("q1", "x");

        let entry = RetrievalRecallScorer
            .score(ScoringInput::new(&question, Err(&failure), Ok(&answer)))
            .await;

        assert!(entry.is_excluded());
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_recorded() {
        let question = QuestionRecord::new("q1", "?").with_reference_doc("a");
        let failure = StageFailure::new(EvalErrorKind::RetrievalFailure, "connection refused");
        let answer = generation("q1", "x");

        let entry = RetrievalRecallScorer
            .score(ScoringInput::new(&question, Err(&failure), Ok(&answer)))
            .await;

        assert_eq!(entry.error(), Some(EvalErrorKind::RetrievalFailure));
    }

    #[tokio::test]
    async fn test_mismatched_question_is_scoring_error() {
        let question = QuestionRecord::new("q1", "?").with_reference_doc("a");
        let result = retrieval("q2", &["a"]);
        let answer = generation("q1", "x");

        let entry = RetrievalRecallScorer
            .score(ScoringInput::new(&question, Ok(&result), Ok(&answer)))
            .await;

        assert_eq!(entry.error(), Some(EvalErrorKind::ScoringError));
    }
}
