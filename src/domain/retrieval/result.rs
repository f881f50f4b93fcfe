use serde::{Deserialize, Serialize};

/// A retrieved chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    #[serde(default)]
    pub content: String,
}

impl RetrievedDocument {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Retriever output for one question, in rank order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub question_id: String,
    pub documents: Vec<RetrievedDocument>,
    pub latency_ms: u64,
}

impl RetrievalResult {
    pub fn new(question_id: impl Into<String>, documents: Vec<RetrievedDocument>) -> Self {
        Self {
            question_id: question_id.into(),
            documents,
            latency_ms: 0,
        }
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn document_ids(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.id.as_str()).collect()
    }

    pub fn contexts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.content.clone()).collect()
    }

    pub fn contains_document(&self, id: &str) -> bool {
        self.documents.iter().any(|d| d.id == id)
    }
}
