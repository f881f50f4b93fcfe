use serde::{Deserialize, Serialize};

/// Answer produced by the generator for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub question_id: String,
    pub answer: String,
    /// Registry name of the provider that produced the answer
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_version: Option<String>,
}

impl GenerationResult {
    pub fn new(
        question_id: impl Into<String>,
        answer: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            answer: answer.into(),
            provider: provider.into(),
            model: model.into(),
            latency_ms: 0,
            retry_count: 0,
            prompt_version: None,
        }
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_prompt_version(mut self, version: Option<String>) -> Self {
        self.prompt_version = version;
        self
    }
}
