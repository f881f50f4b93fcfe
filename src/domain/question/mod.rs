//! Question set domain
//!
//! A question set is the fixed, ordered list of queries an evaluation runs
//! through the RAG pipeline. Records are immutable once loaded.

mod record;
mod validation;

pub use record::{QuestionRecord, QuestionSet};
pub use validation::{validate_question_id, QuestionValidationError, MAX_QUESTION_ID_LENGTH};
