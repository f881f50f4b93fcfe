use std::fmt::Debug;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::RetrievalResult;
use crate::domain::question::QuestionRecord;
use crate::domain::DomainError;

/// External retriever: vector store lookup or any equivalent service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Retriever: Send + Sync + Debug {
    /// Retrieve the ranked context for one question
    async fn retrieve(&self, question: &QuestionRecord) -> Result<RetrievalResult, DomainError>;

    /// Name recorded in the config snapshot
    fn retriever_name(&self) -> &'static str;
}
