//! Judge implementations

mod llm_judge;

pub use llm_judge::{LlmJudge, DEFAULT_JUDGE_PROMPT};
