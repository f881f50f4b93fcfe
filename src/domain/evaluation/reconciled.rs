use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::scoring::Axis;

/// Fewest runs a reconciled score is considered statistically defensible with
pub const RECOMMENDED_MIN_RUNS: usize = 3;

/// Cross-run statistics for one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledAxis {
    pub axis: Axis,
    /// Mean of the per-run axis means; `None` when no run had data
    pub mean: Option<f64>,
    /// Sample standard deviation (n-1); `None` with fewer than 2 samples
    pub std_dev: Option<f64>,
    /// Runs that contributed a mean to this axis
    pub samples: usize,
    pub unstable: bool,
}

/// Reduction of N >= 2 runs over the same question set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledSummary {
    pub run_ids: Vec<Uuid>,
    pub axes: Vec<ReconciledAxis>,
    pub instability_threshold: f64,
}

impl ReconciledSummary {
    pub fn axis(&self, axis: Axis) -> Option<&ReconciledAxis> {
        self.axes.iter().find(|a| a.axis == axis)
    }

    pub fn axis_mean(&self, axis: Axis) -> Option<f64> {
        self.axis(axis).and_then(|a| a.mean)
    }

    pub fn unstable_axes(&self) -> Vec<Axis> {
        self.axes
            .iter()
            .filter(|a| a.unstable)
            .map(|a| a.axis)
            .collect()
    }

    pub fn run_count(&self) -> usize {
        self.run_ids.len()
    }
}
