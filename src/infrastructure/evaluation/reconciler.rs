use tracing::{info, warn};

use super::statistics;
use crate::domain::evaluation::{
    ReconcileError, ReconciledAxis, ReconciledSummary, RunSummary, RECOMMENDED_MIN_RUNS,
};
use crate::domain::scoring::Axis;

pub const DEFAULT_INSTABILITY_THRESHOLD: f64 = 0.15;

/// Reduces repeated runs to per-axis mean and spread ("Rule of 3")
#[derive(Debug, Clone)]
pub struct Reconciler {
    instability_threshold: f64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_INSTABILITY_THRESHOLD)
    }
}

impl Reconciler {
    pub fn new(instability_threshold: f64) -> Self {
        Self {
            instability_threshold,
        }
    }

    pub fn instability_threshold(&self) -> f64 {
        self.instability_threshold
    }

    /// Combine run summaries read-only; runs with no data on an axis are
    /// skipped for that axis
    pub fn reconcile(&self, runs: &[RunSummary]) -> Result<ReconciledSummary, ReconcileError> {
        if runs.len() < 2 {
            return Err(ReconcileError::NotEnoughRuns { count: runs.len() });
        }

        if runs.len() < RECOMMENDED_MIN_RUNS {
            warn!(
                runs = runs.len(),
                recommended = RECOMMENDED_MIN_RUNS,
                "Reconciling fewer runs than recommended"
            );
        }

        let axes = Axis::ALL
            .iter()
            .map(|axis| self.reconcile_axis(*axis, runs))
            .collect::<Vec<_>>();

        for axis in axes.iter().filter(|a| a.unstable) {
            warn!(
                axis = %axis.axis,
                std_dev = axis.std_dev.unwrap_or_default(),
                threshold = self.instability_threshold,
                "Axis unstable across runs"
            );
        }

        info!(runs = runs.len(), "Reconciled runs");

        Ok(ReconciledSummary {
            run_ids: runs.iter().map(|r| r.run_id).collect(),
            axes,
            instability_threshold: self.instability_threshold,
        })
    }

    fn reconcile_axis(&self, axis: Axis, runs: &[RunSummary]) -> ReconciledAxis {
        let samples: Vec<f64> = runs.iter().filter_map(|r| r.axis_mean(axis)).collect();
        let std_dev = statistics::std_dev(&samples);

        ReconciledAxis {
            axis,
            mean: statistics::mean(&samples),
            std_dev,
            samples: samples.len(),
            unstable: std_dev.is_some_and(|sd| sd > self.instability_threshold),
        }
    }
}
