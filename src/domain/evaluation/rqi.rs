use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ReconciledSummary, RunSummary};
use crate::domain::scoring::Axis;
use crate::domain::DomainError;

/// Summary an RQI report can be computed from
#[derive(Debug, Clone, Copy)]
pub enum EvaluationSummary<'a> {
    Run(&'a RunSummary),
    Reconciled(&'a ReconciledSummary),
}

impl EvaluationSummary<'_> {
    pub fn axis_mean(&self, axis: Axis) -> Option<f64> {
        match self {
            Self::Run(run) => run.axis_mean(axis),
            Self::Reconciled(reconciled) => reconciled.axis_mean(axis),
        }
    }

    /// Axes flagged unstable; always empty for a single run
    pub fn unstable_axes(&self) -> Vec<Axis> {
        match self {
            Self::Run(_) => Vec::new(),
            Self::Reconciled(reconciled) => reconciled.unstable_axes(),
        }
    }

    pub fn std_dev(&self, axis: Axis) -> Option<f64> {
        match self {
            Self::Run(_) => None,
            Self::Reconciled(reconciled) => reconciled.axis(axis).and_then(|a| a.std_dev),
        }
    }

    /// Runs the summary was built from
    pub fn run_count(&self) -> usize {
        match self {
            Self::Run(_) => 1,
            Self::Reconciled(reconciled) => reconciled.run_count(),
        }
    }

    /// Questions a cancelled single run never evaluated
    pub fn skipped(&self) -> usize {
        match self {
            Self::Run(run) if run.cancelled => run.skipped,
            _ => 0,
        }
    }

    pub fn source(&self) -> SummarySource {
        match self {
            Self::Run(run) => SummarySource::Run {
                run_id: run.run_id,
            },
            Self::Reconciled(reconciled) => SummarySource::Reconciled {
                run_ids: reconciled.run_ids.clone(),
            },
        }
    }
}

/// Lineage of a report: exactly one summary kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SummarySource {
    Run { run_id: Uuid },
    Reconciled { run_ids: Vec<Uuid> },
}

/// Per-axis weights of the composite index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RqiWeights {
    pub retrieval: f64,
    pub factuality: f64,
    pub reasoning: f64,
}

impl Default for RqiWeights {
    fn default() -> Self {
        let third = 1.0 / 3.0;
        Self {
            retrieval: third,
            factuality: third,
            reasoning: third,
        }
    }
}

impl RqiWeights {
    pub fn new(retrieval: f64, factuality: f64, reasoning: f64) -> Self {
        Self {
            retrieval,
            factuality,
            reasoning,
        }
    }

    pub fn weight(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Retrieval => self.retrieval,
            Axis::Factuality => self.factuality,
            Axis::Reasoning => self.reasoning,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for axis in Axis::ALL {
            let w = self.weight(axis);
            if !w.is_finite() || w < 0.0 {
                return Err(DomainError::configuration(format!(
                    "RQI weight for {} must be finite and non-negative, got {}",
                    axis, w
                )));
            }
        }

        if Axis::ALL.iter().map(|a| self.weight(*a)).sum::<f64>() <= 0.0 {
            return Err(DomainError::configuration("RQI weights must not all be zero"));
        }

        Ok(())
    }
}

/// Lower bounds of each grade bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingThresholds {
    pub excellent: f64,
    pub acceptable: f64,
    pub needs_improvement: f64,
}

impl Default for GradingThresholds {
    fn default() -> Self {
        Self {
            excellent: 0.85,
            acceptable: 0.70,
            needs_improvement: 0.50,
        }
    }
}

impl GradingThresholds {
    pub fn grade(&self, rqi: Option<f64>) -> Grade {
        match rqi {
            None => Grade::NoData,
            Some(v) if v >= self.excellent => Grade::Excellent,
            Some(v) if v >= self.acceptable => Grade::Acceptable,
            Some(v) if v >= self.needs_improvement => Grade::NeedsImprovement,
            Some(_) => Grade::Fails,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);

        if !in_range(self.excellent) || !in_range(self.acceptable) || !in_range(self.needs_improvement)
        {
            return Err(DomainError::configuration(
                "grading thresholds must lie in [0, 1]",
            ));
        }

        if self.excellent < self.acceptable || self.acceptable < self.needs_improvement {
            return Err(DomainError::configuration(
                "grading thresholds must be ordered excellent >= acceptable >= needs_improvement",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Acceptable,
    NeedsImprovement,
    Fails,
    NoData,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Acceptable => "acceptable",
            Self::NeedsImprovement => "needs improvement",
            Self::Fails => "fails",
            Self::NoData => "no data",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one axis fed into the composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisContribution {
    pub axis: Axis,
    pub mean: Option<f64>,
    /// Configured weight
    pub weight: f64,
    /// Weight after renormalising over axes with data
    pub effective_weight: f64,
    pub contribution: f64,
    /// True when the axis had no data and was left out
    pub excluded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    #[serde(default)]
    pub unstable: bool,
}

/// Composite RAG Quality Index with its diagnostic justification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RqiReport {
    pub rqi: Option<f64>,
    pub grade: Grade,
    pub contributions: Vec<AxisContribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottleneck: Option<Axis>,
    pub justification: Vec<String>,
    pub source: SummarySource,
}

impl RqiReport {
    pub fn contribution(&self, axis: Axis) -> Option<&AxisContribution> {
        self.contributions.iter().find(|c| c.axis == axis)
    }

    pub fn excluded_axes(&self) -> Vec<Axis> {
        self.contributions
            .iter()
            .filter(|c| c.excluded)
            .map(|c| c.axis)
            .collect()
    }
}
