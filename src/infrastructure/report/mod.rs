//! Report artifacts: persistence and cross-run comparison

mod comparison;
mod error;
mod writer;

pub use comparison::{
    comparison_table, PromptVersionComparison, QuestionScores, VersionSummary, UNVERSIONED,
};
pub use error::ReportError;
pub use writer::{load_report, validate_run_name, ReportWriter};
