use std::time::Duration;

use thiserror::Error;

use crate::domain::scoring::EvalErrorKind;

/// Successful external call together with its retry bookkeeping
#[derive(Debug, Clone)]
pub struct CallOutcome<T> {
    pub value: T,
    /// Attempts made, including the successful one
    pub attempts: u32,
    /// Retries performed before success (attempts - 1)
    pub retry_count: u32,
    /// Wall-clock latency including backoff sleeps
    pub latency_ms: u64,
    /// Delays actually slept between attempts
    pub delays: Vec<Duration>,
}

/// Failed external call after the retry policy was applied
#[derive(Debug, Error)]
pub enum CallError {
    #[error("Rate limit exceeded after {attempts} attempts: {last_error}")]
    RateLimitExceeded {
        attempts: u32,
        delays: Vec<Duration>,
        last_error: String,
    },

    #[error("Fatal call error after {attempts} attempt(s): {message}")]
    Fatal { attempts: u32, message: String },

    /// The call completed but its response could not be used
    #[error("Malformed response after {attempts} attempt(s): {message}")]
    Malformed { attempts: u32, message: String },
}

impl CallError {
    pub fn kind(&self) -> EvalErrorKind {
        match self {
            Self::RateLimitExceeded { .. } => EvalErrorKind::RateLimitExceeded,
            Self::Fatal { .. } => EvalErrorKind::FatalCallError,
            Self::Malformed { .. } => EvalErrorKind::ScoringError,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::RateLimitExceeded { attempts, .. }
            | Self::Fatal { attempts, .. }
            | Self::Malformed { attempts, .. } => *attempts,
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.attempts().saturating_sub(1)
    }
}
