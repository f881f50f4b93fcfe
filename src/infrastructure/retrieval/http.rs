use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::Instant;

use crate::domain::question::QuestionRecord;
use crate::domain::retrieval::{RetrievalResult, RetrievedDocument, Retriever};
use crate::domain::DomainError;
use crate::infrastructure::llm::HttpClientTrait;

/// Retriever backed by a search service
///
/// POSTs `{"question", "top_k"}` and expects `{"documents": [{"id", "content"}]}`
/// in rank order.
#[derive(Debug)]
pub struct HttpRetriever<C: HttpClientTrait> {
    client: C,
    endpoint: String,
    top_k: usize,
    auth_header: Option<String>,
}

impl<C: HttpClientTrait> HttpRetriever<C> {
    pub fn new(client: C, endpoint: impl Into<String>, top_k: usize) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            top_k,
            auth_header: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.auth_header = Some(format!("Bearer {}", api_key.into()));
        self
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];
        if let Some(auth) = &self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }
        headers
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    documents: Vec<RetrievedDocument>,
}

#[async_trait]
impl<C: HttpClientTrait> Retriever for HttpRetriever<C> {
    async fn retrieve(&self, question: &QuestionRecord) -> Result<RetrievalResult, DomainError> {
        let started = Instant::now();
        let body = serde_json::json!({
            "question": question.question,
            "top_k": self.top_k,
        });

        let response = self
            .client
            .post_json(&self.endpoint, self.headers(), &body)
            .await
            .map_err(|e| DomainError::retrieval(format!("Search request failed: {}", e)))?;

        let parsed: SearchResponse = serde_json::from_value(response)
            .map_err(|e| DomainError::retrieval(format!("Malformed search response: {}", e)))?;

        Ok(RetrievalResult::new(question.id.clone(), parsed.documents)
            .with_latency_ms(started.elapsed().as_millis() as u64))
    }

    fn retriever_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::MockHttpClient;

    const ENDPOINT: &str = "http://search.local/query";

    #[tokio::test]
    async fn test_http_retriever_keeps_rank_order() {
        let client = MockHttpClient::new().with_response(
            ENDPOINT,
            serde_json::json!({
                "documents": [
                    {"id": "doc-2", "content": "second"},
                    {"id": "doc-1", "content": "first"}
                ]
            }),
        );
        let retriever = HttpRetriever::new(client, ENDPOINT, 3);
        let question = QuestionRecord::new("q1", "What is RAG?");

        let result = retriever.retrieve(&question).await.unwrap();

        assert_eq!(result.question_id, "q1");
        assert_eq!(result.document_ids(), vec!["doc-2", "doc-1"]);

        let (_, body) = retriever.client.requests().remove(0);
        assert_eq!(body["top_k"], 3);
        assert_eq!(body["question"], "What is RAG?");
    }

    #[tokio::test]
    async fn test_malformed_response_is_retrieval_error() {
        let client =
            MockHttpClient::new().with_response(ENDPOINT, serde_json::json!({"hits": []}));
        let retriever = HttpRetriever::new(client, ENDPOINT, 3);

        let err = retriever
            .retrieve(&QuestionRecord::new("q1", "?"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Retrieval { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_retrieval_error() {
        let client = MockHttpClient::new().with_error(ENDPOINT, 503, "unavailable");
        let retriever = HttpRetriever::new(client, ENDPOINT, 3);

        let err = retriever
            .retrieve(&QuestionRecord::new("q1", "?"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("503"));
    }
}
