use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::domain::resilience::{CallError, CallOutcome, FailureKind, RetryPolicy};
use crate::domain::scoring::EvalErrorKind;
use crate::domain::DomainError;
use crate::infrastructure::observability;

/// Wraps external model invocations with classification, exponential
/// backoff and jitter
///
/// Backoff sleeps are async timers, so a worker waiting on a throttled
/// provider never blocks other questions.
#[derive(Debug)]
pub struct ResilientCaller {
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
}

impl ResilientCaller {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic jitter for reproducible schedules
    pub fn with_seed(policy: RetryPolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn jitter(&self) -> Duration {
        if self.policy.jitter_ms == 0 {
            return Duration::ZERO;
        }

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Duration::from_millis(rng.gen_range(0..=self.policy.jitter_ms))
    }

    /// Delay before retry number `retry` (0-indexed), jitter included
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.policy.base_delay(retry) + self.jitter()
    }

    /// Run `call` until it succeeds, fails fatally or the attempt budget is
    /// spent. `operation` labels logs and metrics.
    pub async fn invoke<T, F, Fut>(
        &self,
        operation: &str,
        mut call: F,
    ) -> Result<CallOutcome<T>, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut delays = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            observability::record_call_attempt(operation);

            let result = match self.policy.attempt_timeout() {
                Some(limit) => match tokio::time::timeout(limit, call()).await {
                    Ok(result) => result,
                    Err(_) => Err(DomainError::timeout(format!(
                        "attempt did not complete within {}ms",
                        limit.as_millis()
                    ))),
                },
                None => call().await,
            };

            let error = match result {
                Ok(value) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    debug!(operation, attempt, latency_ms, "Call succeeded");

                    return Ok(CallOutcome {
                        value,
                        attempts: attempt,
                        retry_count: attempt - 1,
                        latency_ms,
                        delays,
                    });
                }
                Err(error) => error,
            };

            let kind = FailureKind::classify(&error);

            if let DomainError::Validation { message } = &error {
                warn!(operation, attempt, error = %message, "Unusable response");
                observability::record_call_failure(operation, EvalErrorKind::ScoringError);

                return Err(CallError::Malformed {
                    attempts: attempt,
                    message: message.clone(),
                });
            }

            if !kind.is_retryable() {
                error!(operation, attempt, error = %error, "Non-retryable call failure");
                observability::record_call_failure(operation, EvalErrorKind::FatalCallError);

                return Err(CallError::Fatal {
                    attempts: attempt,
                    message: error.to_string(),
                });
            }

            if attempt >= max_attempts {
                warn!(
                    operation,
                    attempts = attempt,
                    error = %error,
                    "Retries exhausted"
                );
                observability::record_call_failure(operation, EvalErrorKind::RateLimitExceeded);

                return Err(CallError::RateLimitExceeded {
                    attempts: attempt,
                    delays,
                    last_error: error.to_string(),
                });
            }

            let delay = self.delay_for_retry(attempt - 1);
            warn!(
                operation,
                attempt,
                max_attempts,
                kind = kind.as_str(),
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retryable failure, backing off"
            );
            observability::record_call_retry(operation, kind);

            tokio::time::sleep(delay).await;
            delays.push(delay);
        }
    }
}
