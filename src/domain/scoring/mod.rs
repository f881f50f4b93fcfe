//! Scoring domain: evaluation axes, per-question score entries and the
//! scoring strategy trait

mod axis;
mod entry;
mod scorer;

pub use axis::Axis;
pub use entry::{AxisOutcome, EvalErrorKind, Evidence, ScoreEntry};
pub use scorer::{Scorer, ScoringInput, StageFailure};
