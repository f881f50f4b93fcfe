//! RQI Eval
//!
//! Evaluates a Retrieval-Augmented-Generation pipeline along three axes:
//! - Retrieval recall against reference documents
//! - Factuality against required keywords
//! - Reasoning as assessed by an LLM judge
//!
//! Repeated runs are reconciled into mean and spread, and condensed into a
//! single RAG Quality Index with a rule-based justification.

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
