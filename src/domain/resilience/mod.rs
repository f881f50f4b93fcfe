//! Resilience domain: retry policy, failure classification and call outcomes
//! for external model invocations.

mod error;
mod failure;
mod policy;

pub use error::{CallError, CallOutcome};
pub use failure::FailureKind;
pub use policy::RetryPolicy;
