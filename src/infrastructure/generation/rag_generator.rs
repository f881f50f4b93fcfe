use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::domain::generation::GenerationResult;
use crate::domain::llm::LlmRequest;
use crate::domain::question::QuestionRecord;
use crate::domain::resilience::CallError;
use crate::domain::retrieval::RetrievalResult;
use crate::infrastructure::llm::ResolvedProvider;
use crate::infrastructure::resilience::ResilientCaller;

const RAG_PROMPT: &str = "Answer the question based only on the following context:
${context}

Question: ${question}";

/// Prompt settings for the generator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub system_prompt: Option<String>,
    /// Label recorded with every answer, for prompt A/B comparisons
    pub prompt_version: String,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            system_prompt: None,
            prompt_version: "prompt_v0".to_string(),
            max_tokens: None,
        }
    }
}

/// Thin RAG adapter: builds the context prompt and asks the provider
#[derive(Debug, Clone)]
pub struct RagGenerator {
    provider: ResolvedProvider,
    caller: Arc<ResilientCaller>,
    settings: GenerationSettings,
}

impl RagGenerator {
    pub fn new(provider: ResolvedProvider, caller: Arc<ResilientCaller>) -> Self {
        Self {
            provider,
            caller,
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn provider_name(&self) -> &str {
        &self.provider.name
    }

    pub fn model(&self) -> &str {
        &self.provider.model
    }

    pub fn prompt_version(&self) -> &str {
        &self.settings.prompt_version
    }

    fn build_request(&self, question: &QuestionRecord, contexts: &[String]) -> LlmRequest {
        let prompt = RAG_PROMPT
            .replace("${context}", &contexts.join("\n\n"))
            .replace("${question}", &question.question);

        let mut builder = LlmRequest::builder();

        if let Some(system) = &self.settings.system_prompt {
            builder = builder.system(system.clone());
        }

        builder = builder.user(prompt).temperature(0.0);

        if let Some(max_tokens) = self.settings.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        builder.build()
    }

    /// Generate an answer from the retrieved context; a failed retrieval
    /// means an empty context
    pub async fn generate(
        &self,
        question: &QuestionRecord,
        retrieval: Option<&RetrievalResult>,
    ) -> Result<GenerationResult, CallError> {
        let contexts = retrieval.map(RetrievalResult::contexts).unwrap_or_default();
        let request = self.build_request(question, &contexts);

        let provider = &self.provider.provider;
        let model = self.provider.model.as_str();
        let request = &request;

        let outcome = self
            .caller
            .invoke("generation", || async move {
                provider.chat(model, request.clone()).await
            })
            .await?;

        debug!(
            question_id = %question.id,
            provider = %self.provider.name,
            retries = outcome.retry_count,
            latency_ms = outcome.latency_ms,
            "Generated answer"
        );

        Ok(GenerationResult::new(
            question.id.clone(),
            outcome.value.content(),
            self.provider.name.clone(),
            self.provider.model.clone(),
        )
        .with_latency_ms(outcome.latency_ms)
        .with_retry_count(outcome.retry_count)
        .with_prompt_version(Some(self.settings.prompt_version.clone())))
    }
}
