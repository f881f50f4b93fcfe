//! Retrieval domain
//!
//! The retriever is an external collaborator; the engine only consumes its
//! ordered results.

mod result;
mod retriever;

pub use result::{RetrievalResult, RetrievedDocument};
pub use retriever::Retriever;

#[cfg(test)]
pub use retriever::MockRetriever;
