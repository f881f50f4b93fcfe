use async_trait::async_trait;

use crate::domain::scoring::{Axis, Evidence, ScoreEntry, Scorer, ScoringInput};

/// Keyword-constraint check: share of required keywords present in the
/// answer, case-insensitive substring match
#[derive(Debug, Clone, Copy, Default)]
pub struct FactualityScorer;

impl FactualityScorer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scorer for FactualityScorer {
    fn axis(&self) -> Axis {
        Axis::Factuality
    }

    async fn score(&self, input: ScoringInput<'_>) -> ScoreEntry {
        let question = input.question;
        let keywords = question.keywords();

        if keywords.is_empty() {
            return ScoreEntry::excluded(Axis::Factuality, &question.id, "no required keywords");
        }

        let generation = match input.generation {
            Ok(generation) => generation,
            Err(failure) => {
                return ScoreEntry::failed(
                    Axis::Factuality,
                    &question.id,
                    failure.kind,
                    failure.message.clone(),
                );
            }
        };

        let answer = generation.answer.to_lowercase();
        let total = keywords.len();
        let (matched, missing): (Vec<&str>, Vec<&str>) = keywords
            .into_iter()
            .partition(|keyword| answer.contains(&keyword.to_lowercase()));

        let score = matched.len() as f64 / total as f64;

        ScoreEntry::scored(
            Axis::Factuality,
            &question.id,
            score,
            Evidence::Keywords {
                matched: matched.into_iter().map(String::from).collect(),
                missing: missing.into_iter().map(String::from).collect(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::question::QuestionRecord;
    use crate::domain::scoring::{EvalErrorKind, StageFailure};
    use crate::infrastructure::scoring::test_support::{generation, retrieval};

    async fn score(question: &QuestionRecord, answer: &str) -> ScoreEntry {
        let result = retrieval(&question.id, &[]);
        let answer = generation(&question.id, answer);
        FactualityScorer
            .score(ScoringInput::new(question, Ok(&result), Ok(&answer)))
            .await
    }

    #[tokio::test]
    async fn test_score_is_share_of_present_keywords() {
        let question = QuestionRecord::new("q1", "Refund policy?").with_required_keywords([
            "30 days",
            "receipt",
            "store credit",
            "manager",
        ]);

        let entry = score(&question, "Within 30 DAYS with a Receipt.").await;

        assert_eq!(entry.score(), Some(0.5));
        match entry.evidence() {
            Some(Evidence::Keywords { matched, missing }) => {
                assert_eq!(matched, &vec!["30 days".to_string(), "receipt".to_string()]);
                assert_eq!(missing.len(), 2);
            }
            other => panic!("unexpected evidence: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_all_and_none_present() {
        let question = QuestionRecord::new("q1", "?").with_required_keywords(["paris"]);

        assert_eq!(score(&question, "It is Paris.").await.score(), Some(1.0));
        assert_eq!(score(&question, "It is Lyon.").await.score(), Some(0.0));
    }

    #[tokio::test]
    async fn test_no_keywords_is_excluded() {
        let question = QuestionRecord::new("q1", "?");
        assert!(score(&question, "anything").await.is_excluded());

        let blank = QuestionRecord::new("q2", "?").with_required_keywords(["  "]);
        assert!(score(&blank, "anything").await.is_excluded());
    }

    #[tokio::test]
    async fn test_generation_failure_propagates_kind() {
        let question = QuestionRecord::new("q1", "?").with_required_keywords(["paris"]);
        let result = retrieval("q1", &[]);
        let failure = StageFailure::new(EvalErrorKind::RateLimitExceeded, "throttled");

        let entry = FactualityScorer
            .score(ScoringInput::new(&question, Ok(&result), Err(&failure)))
            .await;

        assert_eq!(entry.error(), Some(EvalErrorKind::RateLimitExceeded));
    }
}
