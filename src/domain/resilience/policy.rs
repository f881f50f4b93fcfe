use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Exponential backoff policy for external model calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Base delay before the first retry
    pub initial_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Upper bound for the exponential part of the delay
    pub max_delay_ms: u64,
    /// Upper bound of the uniform jitter added to each delay
    pub jitter_ms: u64,
    /// Per-attempt timeout; elapsed attempts count as retryable failures
    pub attempt_timeout_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 2_000,
            backoff_multiplier: 2.0,
            max_delay_ms: 60_000,
            jitter_ms: 500,
            attempt_timeout_ms: Some(120_000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    pub fn with_initial_delay(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    pub fn with_max_delay(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, ms: u64) -> Self {
        self.jitter_ms = ms;
        self
    }

    pub fn with_attempt_timeout(mut self, ms: Option<u64>) -> Self {
        self.attempt_timeout_ms = ms;
        self
    }

    /// Delay before retry number `retry` (0-indexed), without jitter:
    /// `min(initial * multiplier^retry, max)`
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = if delay.is_finite() {
            delay.min(self.max_delay_ms as f64)
        } else {
            self.max_delay_ms as f64
        };

        Duration::from_millis(capped.max(0.0) as u64)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_attempts == 0 {
            return Err(DomainError::configuration(
                "retry.max_attempts must be at least 1",
            ));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(DomainError::configuration(
                "retry.backoff_multiplier must be a finite value >= 1.0",
            ));
        }

        if self.max_delay_ms < self.initial_delay_ms {
            return Err(DomainError::configuration(
                "retry.max_delay_ms must be >= retry.initial_delay_ms",
            ));
        }

        Ok(())
    }
}
