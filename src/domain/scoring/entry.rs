use std::fmt;

use serde::{Deserialize, Serialize};

use super::Axis;

/// Error taxonomy for per-question, per-axis failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalErrorKind {
    /// Retriever unreachable or returned a malformed response
    RetrievalFailure,
    /// Resilient caller exhausted its retries
    RateLimitExceeded,
    /// Auth failure or malformed request; indicates misconfiguration
    FatalCallError,
    /// Scorer received malformed input
    ScoringError,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RetrievalFailure => "RetrievalFailure",
            Self::RateLimitExceeded => "RateLimitExceeded",
            Self::FatalCallError => "FatalCallError",
            Self::ScoringError => "ScoringError",
        };
        f.write_str(name)
    }
}

/// Raw evidence behind a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    Recall {
        expected: Vec<String>,
        matched: Vec<String>,
        retrieved: Vec<String>,
    },
    Keywords {
        matched: Vec<String>,
        missing: Vec<String>,
    },
    Judge {
        faithfulness: f64,
        relevancy: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
        retry_count: u32,
    },
}

impl Evidence {
    /// One-line explanation for reports
    pub fn summary(&self) -> String {
        match self {
            Self::Recall {
                expected, matched, ..
            } => {
                if matched.is_empty() {
                    format!("none of [{}] retrieved", expected.join(", "))
                } else {
                    format!("retrieved [{}]", matched.join(", "))
                }
            }
            Self::Keywords { matched, missing } => {
                if missing.is_empty() {
                    format!("all {} keywords present", matched.len())
                } else {
                    format!("missing keywords: {}", missing.join(", "))
                }
            }
            Self::Judge {
                faithfulness,
                relevancy,
                ..
            } => format!(
                "faithfulness={:.2} relevancy={:.2}",
                faithfulness, relevancy
            ),
        }
    }
}

/// Result of scoring one question on one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AxisOutcome {
    Scored { score: f64, evidence: Evidence },
    /// Question not applicable to this axis; not counted as a failure
    Excluded { reason: String },
    Failed { error: EvalErrorKind, message: String },
}

/// Score for one (axis, question) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub axis: Axis,
    pub question_id: String,
    #[serde(flatten)]
    pub outcome: AxisOutcome,
}

impl ScoreEntry {
    /// Scored entry; scores are clamped to [0,1] and non-finite values
    /// become a scoring failure
    pub fn scored(axis: Axis, question_id: impl Into<String>, score: f64, evidence: Evidence) -> Self {
        let question_id = question_id.into();

        if !score.is_finite() {
            return Self::failed(
                axis,
                question_id,
                EvalErrorKind::ScoringError,
                format!("non-finite score {}", score),
            );
        }

        Self {
            axis,
            question_id,
            outcome: AxisOutcome::Scored {
                score: score.clamp(0.0, 1.0),
                evidence,
            },
        }
    }

    pub fn excluded(axis: Axis, question_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            axis,
            question_id: question_id.into(),
            outcome: AxisOutcome::Excluded {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(
        axis: Axis,
        question_id: impl Into<String>,
        error: EvalErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            axis,
            question_id: question_id.into(),
            outcome: AxisOutcome::Failed {
                error,
                message: message.into(),
            },
        }
    }

    pub fn score(&self) -> Option<f64> {
        match &self.outcome {
            AxisOutcome::Scored { score, .. } => Some(*score),
            _ => None,
        }
    }

    pub fn evidence(&self) -> Option<&Evidence> {
        match &self.outcome {
            AxisOutcome::Scored { evidence, .. } => Some(evidence),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<EvalErrorKind> {
        match &self.outcome {
            AxisOutcome::Failed { error, .. } => Some(*error),
            _ => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self.outcome, AxisOutcome::Scored { .. })
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self.outcome, AxisOutcome::Excluded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, AxisOutcome::Failed { .. })
    }
}
