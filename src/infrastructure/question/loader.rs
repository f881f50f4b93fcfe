use std::path::Path;

use tracing::info;

use crate::domain::question::QuestionSet;
use crate::domain::DomainError;

/// Read and validate a JSON question-set file
pub async fn load_question_set(path: impl AsRef<Path>) -> Result<QuestionSet, DomainError> {
    let path = path.as_ref();

    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        DomainError::storage(format!(
            "Failed to read question set {}: {}",
            path.display(),
            e
        ))
    })?;

    let set = QuestionSet::from_json(&json)?;
    info!(path = %path.display(), questions = set.len(), "Loaded question set");

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_question_set() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "q1", "question": "What is RAG?", "reference_doc_id": "doc-1"}},
                {{"id": "q2", "question": "Refund window?", "required_keywords": ["30 days"]}}
            ]"#
        )
        .unwrap();

        let set = load_question_set(file.path()).await.unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next().unwrap().id, "q1");
    }

    #[tokio::test]
    async fn test_missing_file_is_storage_error() {
        let err = load_question_set("/definitely/not/here.json")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "q1", "question": "a"}}, {{"id": "q1", "question": "b"}}]"#
        )
        .unwrap();

        let err = load_question_set(file.path()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }
}
