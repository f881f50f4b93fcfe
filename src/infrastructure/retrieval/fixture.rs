use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::question::QuestionRecord;
use crate::domain::retrieval::{RetrievalResult, RetrievedDocument, Retriever};
use crate::domain::DomainError;

/// Precomputed retrievals keyed by question id
///
/// Lets an evaluation replay a fixed retriever output, e.g. one exported
/// from a vector store run.
#[derive(Debug, Clone, Default)]
pub struct FixtureRetriever {
    results: HashMap<String, Vec<RetrievedDocument>>,
}

impl FixtureRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(
        mut self,
        question_id: impl Into<String>,
        documents: Vec<RetrievedDocument>,
    ) -> Self {
        self.results.insert(question_id.into(), documents);
        self
    }

    /// Parse `{"<question_id>": [{"id", "content"}, ...]}`
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let results: HashMap<String, Vec<RetrievedDocument>> = serde_json::from_str(json)
            .map_err(|e| DomainError::validation(format!("Invalid retrieval fixture: {}", e)))?;

        Ok(Self { results })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to read retrieval fixture {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[async_trait]
impl Retriever for FixtureRetriever {
    async fn retrieve(&self, question: &QuestionRecord) -> Result<RetrievalResult, DomainError> {
        let documents = self.results.get(&question.id).ok_or_else(|| {
            DomainError::retrieval(format!("No fixture retrieval for question '{}'", question.id))
        })?;

        Ok(RetrievalResult::new(question.id.clone(), documents.clone()))
    }

    fn retriever_name(&self) -> &'static str {
        "fixture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_from_json() {
        let retriever = FixtureRetriever::from_json(
            r#"{"q1": [{"id": "doc-1", "content": "RAG combines retrieval and generation"}]}"#,
        )
        .unwrap();

        let result = retriever
            .retrieve(&QuestionRecord::new("q1", "What is RAG?"))
            .await
            .unwrap();

        assert_eq!(result.document_ids(), vec!["doc-1"]);
        assert_eq!(retriever.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_question_is_retrieval_error() {
        let retriever = FixtureRetriever::new();

        let err = retriever
            .retrieve(&QuestionRecord::new("q9", "?"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Retrieval { .. }));
    }

    #[tokio::test]
    async fn test_load_fixture_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retrievals.json");
        tokio::fs::write(&path, r#"{"q1": [{"id": "a"}, {"id": "b"}]}"#)
            .await
            .unwrap();

        let retriever = FixtureRetriever::load(&path).await.unwrap();
        let result = retriever
            .retrieve(&QuestionRecord::new("q1", "?"))
            .await
            .unwrap();

        assert_eq!(result.document_ids(), vec!["a", "b"]);
    }
}
