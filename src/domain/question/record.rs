use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::validation::{validate_question_id, QuestionValidationError};
use crate::domain::DomainError;

/// One evaluation question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestionRecord")]
pub struct QuestionRecord {
    pub id: String,
    pub question: String,
    /// Documents that contain the expected answer
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_doc_ids: Vec<String>,
    /// Keywords the generated answer must mention
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub golden_answer: Option<String>,
}

impl QuestionRecord {
    pub fn new(id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            reference_doc_ids: Vec::new(),
            required_keywords: None,
            golden_answer: None,
        }
    }

    pub fn with_reference_doc(mut self, doc_id: impl Into<String>) -> Self {
        self.reference_doc_ids.push(doc_id.into());
        self
    }

    pub fn with_required_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_golden_answer(mut self, answer: impl Into<String>) -> Self {
        self.golden_answer = Some(answer.into());
        self
    }

    /// Keywords that are non-blank after trimming
    pub fn keywords(&self) -> Vec<&str> {
        self.required_keywords
            .iter()
            .flatten()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect()
    }

    pub fn has_reference_docs(&self) -> bool {
        self.reference_doc_ids.iter().any(|id| !id.trim().is_empty())
    }

    fn validate(&self) -> Result<(), QuestionValidationError> {
        validate_question_id(&self.id)?;

        if self.question.trim().is_empty() {
            return Err(QuestionValidationError::EmptyQuestion {
                id: self.id.clone(),
            });
        }

        Ok(())
    }
}

/// Wire format accepting either a single `reference_doc_id` or a list
#[derive(Debug, Deserialize)]
struct RawQuestionRecord {
    id: String,
    question: String,
    #[serde(default)]
    reference_doc_id: Option<String>,
    #[serde(default)]
    reference_doc_ids: Vec<String>,
    #[serde(default, alias = "keywords")]
    required_keywords: Option<Vec<String>>,
    #[serde(default, alias = "ground_truth")]
    golden_answer: Option<String>,
}

impl TryFrom<RawQuestionRecord> for QuestionRecord {
    type Error = QuestionValidationError;

    fn try_from(raw: RawQuestionRecord) -> Result<Self, Self::Error> {
        let mut reference_doc_ids = raw.reference_doc_ids;

        if let Some(single) = raw.reference_doc_id {
            if !reference_doc_ids.contains(&single) {
                reference_doc_ids.insert(0, single);
            }
        }

        let record = Self {
            id: raw.id,
            question: raw.question,
            reference_doc_ids,
            required_keywords: raw.required_keywords,
            golden_answer: raw.golden_answer,
        };

        record.validate()?;
        Ok(record)
    }
}

/// Ordered, validated collection of questions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestionSet {
    questions: Vec<QuestionRecord>,
}

impl QuestionSet {
    /// Build a question set, rejecting duplicate IDs
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();

        for question in &questions {
            question
                .validate()
                .map_err(|e| DomainError::validation(e.to_string()))?;

            if !seen.insert(question.id.as_str()) {
                return Err(DomainError::validation(
                    QuestionValidationError::DuplicateId {
                        id: question.id.clone(),
                    }
                    .to_string(),
                ));
            }
        }

        Ok(Self { questions })
    }

    /// Parse a JSON array of question records
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let questions: Vec<QuestionRecord> = serde_json::from_str(json)
            .map_err(|e| DomainError::validation(format!("Invalid question set: {}", e)))?;

        Self::new(questions)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuestionRecord> {
        self.questions.iter()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&QuestionRecord> {
        self.questions.iter().find(|q| q.id == id)
    }
}
