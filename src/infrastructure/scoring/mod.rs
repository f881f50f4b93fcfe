//! Scoring strategies, one per evaluation axis

mod factuality;
mod reasoning;
mod retrieval_recall;

pub use factuality::FactualityScorer;
pub use reasoning::ReasoningScorer;
pub use retrieval_recall::RetrievalRecallScorer;
