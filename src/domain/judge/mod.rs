//! LLM-judge domain
//!
//! A judge grades a generated answer for faithfulness (supported by the
//! retrieved context) and relevancy (addresses the question).

mod verdict;

pub use verdict::{Judge, JudgeRequest, JudgeVerdict, ReasoningWeights};

#[cfg(test)]
pub use verdict::mock::MockJudge;
