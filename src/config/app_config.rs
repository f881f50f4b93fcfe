use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::evaluation::{GradingThresholds, RqiWeights};
use crate::domain::judge::ReasoningWeights;
use crate::domain::resilience::RetryPolicy;
use crate::domain::DomainError;
use crate::infrastructure::generation::GenerationSettings;
use crate::infrastructure::llm::ProviderSettings;
use crate::infrastructure::logging::LoggingConfig;
use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub observability: ObservabilityConfig,
    pub evaluation: EvaluationConfig,
    pub retry: RetryPolicy,
    pub retriever: RetrieverConfig,
    /// Additional or overridden providers, keyed by registry name
    pub providers: HashMap<String, ProviderSettings>,
    pub generation: GenerationSettings,
    pub judge: JudgeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub questions: PathBuf,
    pub results_dir: PathBuf,
    /// Runs per invocation; more than one enables reconciliation
    pub runs: usize,
    pub max_concurrency: usize,
    pub instability_threshold: f64,
    pub weights: RqiWeights,
    pub grading: GradingThresholds,
    pub reasoning_weights: ReasoningWeights,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            questions: PathBuf::from("data/questions.json"),
            results_dir: PathBuf::from("data/results"),
            runs: 3,
            max_concurrency: 4,
            instability_threshold: 0.15,
            weights: RqiWeights::default(),
            grading: GradingThresholds::default(),
            reasoning_weights: ReasoningWeights::default(),
        }
    }
}

/// Where retrieved context comes from
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RetrieverConfig {
    Http {
        endpoint: String,
        #[serde(default = "default_top_k")]
        top_k: usize,
        #[serde(default)]
        api_key_env: Option<String>,
    },
    Fixture {
        path: PathBuf,
    },
}

fn default_top_k() -> usize {
    3
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self::Fixture {
            path: PathBuf::from("data/retrievals.json"),
        }
    }
}

/// Judge endpoint; falls back to the generation provider when unset
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct JudgeConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub prompt_template: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject settings that would make scores meaningless
    pub fn validate(&self) -> Result<(), DomainError> {
        let evaluation = &self.evaluation;

        if evaluation.runs == 0 {
            return Err(DomainError::configuration("evaluation.runs must be at least 1"));
        }

        if evaluation.max_concurrency == 0 {
            return Err(DomainError::configuration(
                "evaluation.max_concurrency must be at least 1",
            ));
        }

        if !evaluation.instability_threshold.is_finite() || evaluation.instability_threshold < 0.0
        {
            return Err(DomainError::configuration(
                "evaluation.instability_threshold must be a non-negative number",
            ));
        }

        if let RetrieverConfig::Http { top_k: 0, .. } = self.retriever {
            return Err(DomainError::configuration("retriever.top_k must be at least 1"));
        }

        evaluation.weights.validate()?;
        evaluation.grading.validate()?;
        evaluation.reasoning_weights.validate()?;
        self.retry.validate()?;

        Ok(())
    }
}
