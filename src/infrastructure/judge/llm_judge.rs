//! LLM-as-judge
//!
//! Asks a model to grade an answer for faithfulness to the retrieved context
//! and relevancy to the question.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::judge::{Judge, JudgeRequest, JudgeVerdict};
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::DomainError;

pub const DEFAULT_JUDGE_PROMPT: &str = r#"You are grading an answer produced by a retrieval-augmented assistant.

Question:
${question}

Retrieved context:
${contexts}

Reference answer:
${golden_answer}

Answer to grade:
${answer}

Rate the answer on two criteria, each from 0 to 10:
- faithfulness: every claim in the answer is supported by the retrieved context
- relevancy: the answer directly addresses the question

Respond with a JSON object only:
{"faithfulness": <0-10>, "relevancy": <0-10>, "explanation": "<one sentence>"}"#;

const JUDGE_MAX_TOKENS: u32 = 300;

/// Judge backed by a chat model
#[derive(Debug)]
pub struct LlmJudge {
    provider: Arc<dyn LlmProvider>,
    model: String,
    prompt_template: String,
}

impl LlmJudge {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            prompt_template: DEFAULT_JUDGE_PROMPT.to_string(),
        }
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_prompt(&self, request: &JudgeRequest) -> String {
        let contexts = if request.contexts.is_empty() {
            "(no context retrieved)".to_string()
        } else {
            request
                .contexts
                .iter()
                .enumerate()
                .map(|(i, context)| format!("[{}] {}", i + 1, context))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        self.prompt_template
            .replace("${question}", &request.question)
            .replace("${contexts}", &contexts)
            .replace(
                "${golden_answer}",
                request.golden_answer.as_deref().unwrap_or("(none provided)"),
            )
            .replace("${answer}", &request.answer)
    }

    fn parse_verdict(&self, response: &str) -> Result<JudgeVerdict, DomainError> {
        let json_str = extract_json(response).ok_or_else(|| {
            warn!("Judge response had no JSON object: {}", response);
            DomainError::validation("judge response contained no JSON object")
        })?;

        let parsed: LlmJudgeResponse = serde_json::from_str(json_str).map_err(|e| {
            warn!("Failed to parse judge response: {} - Response: {}", e, response);
            DomainError::validation(format!("Invalid judge response format: {}", e))
        })?;

        let mut verdict = JudgeVerdict::new(
            normalize_score(parsed.faithfulness)?,
            normalize_score(parsed.relevancy)?,
        );

        if let Some(explanation) = parsed.explanation {
            verdict = verdict.with_explanation(explanation);
        }

        Ok(verdict)
    }
}

#[derive(Debug, Deserialize)]
struct LlmJudgeResponse {
    faithfulness: f64,
    relevancy: f64,
    #[serde(default, alias = "reason")]
    explanation: Option<String>,
}

/// Map a judge score onto [0,1]; values above 1 are read as a 0-10 scale
fn normalize_score(score: f64) -> Result<f64, DomainError> {
    if !score.is_finite() {
        return Err(DomainError::validation(format!(
            "judge score {} is not a number",
            score
        )));
    }

    let scaled = if score > 1.0 { score / 10.0 } else { score };
    Ok(scaled.clamp(0.0, 1.0))
}

/// Extract JSON object from a string (handles markdown code blocks)
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    if start < end {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeVerdict, DomainError> {
        let prompt = self.build_prompt(request);

        debug!(
            question_id = %request.question_id,
            model = %self.model,
            "Judging answer"
        );

        let llm_request = LlmRequest::builder()
            .user(prompt)
            .temperature(0.0)
            .max_tokens(JUDGE_MAX_TOKENS)
            .json_mode(true)
            .build();

        let response = self.provider.chat(&self.model, llm_request).await?;
        let verdict = self.parse_verdict(response.content())?;

        debug!(
            question_id = %request.question_id,
            faithfulness = verdict.faithfulness,
            relevancy = verdict.relevancy,
            "Judge verdict"
        );

        Ok(verdict)
    }

    fn judge_name(&self) -> &'static str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MockLlmProvider;

    fn request() -> JudgeRequest {
        JudgeRequest {
            question_id: "q1".to_string(),
            question: "What is the capital of France?".to_string(),
            answer: "Paris".to_string(),
            contexts: vec!["Paris is the capital of France.".to_string()],
            golden_answer: Some("Paris".to_string()),
        }
    }

    fn judge_with_response(content: &str) -> LlmJudge {
        let provider = Arc::new(MockLlmProvider::new("mock").with_response(content));
        LlmJudge::new(provider, "judge-model")
    }

    #[test]
    fn test_extract_json_with_markdown() {
        let text = "```json\n{\"faithfulness\": 7, \"relevancy\": 9}\n```";
        assert_eq!(
            extract_json(text),
            Some("{\"faithfulness\": 7, \"relevancy\": 9}")
        );
        assert!(extract_json("no json").is_none());
    }

    #[test]
    fn test_normalize_score_scales() {
        assert_eq!(normalize_score(0.8).unwrap(), 0.8);
        assert_eq!(normalize_score(8.0).unwrap(), 0.8);
        assert_eq!(normalize_score(1.0).unwrap(), 1.0);
        assert_eq!(normalize_score(15.0).unwrap(), 1.0);
        assert_eq!(normalize_score(-2.0).unwrap(), 0.0);
        assert!(normalize_score(f64::NAN).is_err());
    }

    #[test]
    fn test_build_prompt_includes_all_inputs() {
        let judge = judge_with_response("{}");
        let prompt = judge.build_prompt(&request());

        assert!(prompt.contains("What is the capital of France?"));
        assert!(prompt.contains("[1] Paris is the capital of France."));
        assert!(prompt.contains("Answer to grade:\nParis"));
        assert!(!prompt.contains("${"));
    }

    #[test]
    fn test_build_prompt_without_context_or_reference() {
        let judge = judge_with_response("{}");
        let mut req = request();
        req.contexts.clear();
        req.golden_answer = None;

        let prompt = judge.build_prompt(&req);

        assert!(prompt.contains("(no context retrieved)"));
        assert!(prompt.contains("(none provided)"));
    }

    #[tokio::test]
    async fn test_judge_parses_ten_point_scale() {
        let judge = judge_with_response(
            r#"{"faithfulness": 9, "relevancy": 7, "explanation": "Supported and on topic"}"#,
        );

        let verdict = judge.judge(&request()).await.unwrap();

        assert!((verdict.faithfulness - 0.9).abs() < 1e-12);
        assert!((verdict.relevancy - 0.7).abs() < 1e-12);
        assert_eq!(verdict.explanation.as_deref(), Some("Supported and on topic"));
    }

    #[tokio::test]
    async fn test_unparseable_output_is_validation_error() {
        let judge = judge_with_response("I think it is pretty good.");

        let err = judge.judge(&request()).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_provider_error_is_passed_through() {
        let provider = Arc::new(
            MockLlmProvider::new("mock")
                .always_failing_for("capital", crate::domain::llm::MockFailure::RateLimit),
        );
        let judge = LlmJudge::new(provider, "judge-model");

        let err = judge.judge(&request()).await.unwrap_err();

        assert!(matches!(err, DomainError::Http { status: 429, .. }));
    }
}
