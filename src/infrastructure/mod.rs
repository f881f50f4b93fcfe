//! Infrastructure layer - External service implementations

pub mod evaluation;
pub mod generation;
pub mod judge;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod question;
pub mod report;
pub mod resilience;
pub mod retrieval;
pub mod scoring;
