use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

// Bare status codes only count when they arrive as `DomainError::Http`.
const THROTTLE_MARKERS: &[&str] = &[
    "rate limit",
    "rate_limit",
    "ratelimit",
    "too many requests",
    "quota",
    "throttl",
    "resource exhausted",
    "resource_exhausted",
    "overloaded",
];

const TIMEOUT_MARKERS: &[&str] = &["timed out", "timeout", "deadline exceeded"];

/// How a failed external call should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Provider throttling (HTTP 429 or a provider-specific message)
    RateLimited,
    /// The attempt did not complete in time
    Timeout,
    /// Malformed request, auth failure or anything else not transient
    Fatal,
}

impl FailureKind {
    /// Classify a provider error
    pub fn classify(error: &DomainError) -> Self {
        match error {
            DomainError::Http { status: 429, .. } => Self::RateLimited,
            DomainError::Http { status: 408 | 504, .. } => Self::Timeout,
            DomainError::Http { status: 400 | 401 | 403 | 404, .. } => Self::Fatal,
            DomainError::Timeout { .. } => Self::Timeout,
            DomainError::Configuration { .. } | DomainError::Validation { .. } => Self::Fatal,
            other => Self::from_message(&other.to_string()),
        }
    }

    fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();

        if THROTTLE_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::RateLimited
        } else if TIMEOUT_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::Timeout
        } else {
            Self::Fatal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Fatal => "fatal",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Timeout)
    }
}
