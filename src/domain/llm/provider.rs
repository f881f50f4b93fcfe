use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Trait for LLM providers (OpenAI-compatible endpoints, Anthropic, ...)
///
/// Generation and judging both go through this trait, so any endpoint that can
/// answer a chat completion can be swapped in behind the resilient caller.
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::llm::Message;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Failure the mock provider should produce
    #[derive(Debug, Clone)]
    pub enum MockFailure {
        RateLimit,
        Timeout,
        Fatal(String),
    }

    impl MockFailure {
        fn to_error(&self, provider: &str) -> DomainError {
            match self {
                Self::RateLimit => DomainError::http(429, "Rate limit reached for requests"),
                Self::Timeout => DomainError::timeout(format!("{} request timed out", provider)),
                Self::Fatal(message) => DomainError::http(401, message.clone()),
            }
        }
    }

    #[derive(Debug)]
    struct FailureRule {
        needle: String,
        failure: MockFailure,
        remaining: Option<u32>,
    }

    /// Scripted provider: answers are picked by matching the user text
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: &'static str,
        default_response: Option<String>,
        responses: Vec<(String, String)>,
        failures: Mutex<Vec<FailureRule>>,
        calls: AtomicU32,
        calls_by_needle: Mutex<HashMap<String, u32>>,
    }

    impl MockLlmProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                default_response: None,
                responses: Vec::new(),
                failures: Mutex::new(Vec::new()),
                calls: AtomicU32::new(0),
                calls_by_needle: Mutex::new(HashMap::new()),
            }
        }

        /// Content returned when no more specific rule matches
        pub fn with_response(mut self, content: impl Into<String>) -> Self {
            self.default_response = Some(content.into());
            self
        }

        /// Content returned when the user text contains `needle`
        pub fn with_response_for(
            mut self,
            needle: impl Into<String>,
            content: impl Into<String>,
        ) -> Self {
            self.responses.push((needle.into(), content.into()));
            self
        }

        /// Fail the first `times` calls whose user text contains `needle`
        pub fn with_failures_for(
            self,
            needle: impl Into<String>,
            failure: MockFailure,
            times: u32,
        ) -> Self {
            self.push_failure(needle.into(), failure, Some(times))
        }

        /// Fail every call whose user text contains `needle`
        pub fn always_failing_for(self, needle: impl Into<String>, failure: MockFailure) -> Self {
            self.push_failure(needle.into(), failure, None)
        }

        fn push_failure(self, needle: String, failure: MockFailure, remaining: Option<u32>) -> Self {
            self.failures.lock().unwrap().push(FailureRule {
                needle,
                failure,
                remaining,
            });
            self
        }

        pub fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        /// Number of calls whose user text contained `needle`
        pub fn calls_for(&self, needle: &str) -> u32 {
            self.calls_by_needle
                .lock()
                .unwrap()
                .get(needle)
                .copied()
                .unwrap_or(0)
        }

        fn record_call(&self, text: &str) {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let mut needles: Vec<String> = self
                .responses
                .iter()
                .map(|(needle, _)| needle.clone())
                .collect();
            needles.extend(self.failures.lock().unwrap().iter().map(|r| r.needle.clone()));
            needles.sort();
            needles.dedup();

            let mut by_needle = self.calls_by_needle.lock().unwrap();
            for needle in needles {
                if text.contains(&needle) {
                    *by_needle.entry(needle).or_insert(0) += 1;
                }
            }
        }

        fn next_failure(&self, text: &str) -> Option<MockFailure> {
            let mut failures = self.failures.lock().unwrap();

            for rule in failures.iter_mut() {
                if !text.contains(&rule.needle) {
                    continue;
                }

                match rule.remaining {
                    None => return Some(rule.failure.clone()),
                    Some(0) => continue,
                    Some(ref mut n) => {
                        *n -= 1;
                        return Some(rule.failure.clone());
                    }
                }
            }

            None
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
            let text = request.user_text();
            self.record_call(&text);

            if let Some(failure) = self.next_failure(&text) {
                return Err(failure.to_error(self.name));
            }

            let content = self
                .responses
                .iter()
                .find(|(needle, _)| text.contains(needle.as_str()))
                .map(|(_, content)| content.clone())
                .or_else(|| self.default_response.clone())
                .ok_or_else(|| DomainError::provider(self.name, "No mock response configured"))?;

            Ok(LlmResponse::new(
                format!("mock-{}", self.call_count()),
                model,
                Message::assistant(content),
            ))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}
