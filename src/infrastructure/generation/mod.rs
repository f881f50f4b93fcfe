//! Answer generation through a configured LLM provider

mod rag_generator;

pub use rag_generator::{GenerationSettings, RagGenerator};
