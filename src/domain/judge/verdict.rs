use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Everything the judge sees for one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeRequest {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub contexts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub golden_answer: Option<String>,
}

/// Judge sub-scores, each in [0,1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub faithfulness: f64,
    pub relevancy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl JudgeVerdict {
    pub fn new(faithfulness: f64, relevancy: f64) -> Self {
        Self {
            faithfulness,
            relevancy,
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// Weights combining the judge sub-scores into one reasoning score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningWeights {
    pub faithfulness: f64,
    pub relevancy: f64,
}

impl Default for ReasoningWeights {
    fn default() -> Self {
        Self {
            faithfulness: 0.5,
            relevancy: 0.5,
        }
    }
}

impl ReasoningWeights {
    pub fn new(faithfulness: f64, relevancy: f64) -> Self {
        Self {
            faithfulness,
            relevancy,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let valid = |w: f64| w.is_finite() && w >= 0.0;

        if !valid(self.faithfulness) || !valid(self.relevancy) {
            return Err(DomainError::configuration(
                "judge weights must be finite and non-negative",
            ));
        }

        if self.faithfulness + self.relevancy <= 0.0 {
            return Err(DomainError::configuration(
                "judge weights must not both be zero",
            ));
        }

        Ok(())
    }

    /// Weighted mean of the two sub-scores, weights normalised to sum to 1
    pub fn combine(&self, verdict: &JudgeVerdict) -> f64 {
        let total = self.faithfulness + self.relevancy;

        if total <= 0.0 {
            return (verdict.faithfulness + verdict.relevancy) / 2.0;
        }

        (self.faithfulness * verdict.faithfulness + self.relevancy * verdict.relevancy) / total
    }
}

/// Trait for answer judges
#[async_trait]
pub trait Judge: Send + Sync + Debug {
    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeVerdict, DomainError>;

    fn judge_name(&self) -> &'static str;
}
