use super::justification::{self, AxisFacts, Coverage};
use crate::domain::evaluation::{
    AxisContribution, EvaluationSummary, GradingThresholds, RqiReport, RqiWeights,
};
use crate::domain::scoring::Axis;

/// Lowest-mean axis with data; earlier axes in `Axis::ALL` win ties
pub fn bottleneck(means: &[(Axis, Option<f64>)]) -> Option<Axis> {
    let mut lowest: Option<(Axis, f64)> = None;

    for (axis, mean) in means {
        if let Some(mean) = mean {
            match lowest {
                Some((_, current)) if *mean >= current => {}
                _ => lowest = Some((*axis, *mean)),
            }
        }
    }

    lowest.map(|(axis, _)| axis)
}

/// Compute the composite index for a run or reconciled summary
///
/// Weights are renormalised over the axes that have data. Pure: the same
/// inputs always give the same report.
pub fn compute(
    summary: EvaluationSummary<'_>,
    weights: &RqiWeights,
    thresholds: &GradingThresholds,
) -> RqiReport {
    let unstable = summary.unstable_axes();
    let means: Vec<(Axis, Option<f64>)> = Axis::ALL
        .iter()
        .map(|axis| (*axis, summary.axis_mean(*axis)))
        .collect();

    let total_weight: f64 = means
        .iter()
        .filter(|(_, mean)| mean.is_some())
        .map(|(axis, _)| weights.weight(*axis))
        .sum();

    let contributions: Vec<AxisContribution> = means
        .iter()
        .map(|(axis, mean)| {
            let weight = weights.weight(*axis);
            let effective_weight = match mean {
                Some(_) if total_weight > 0.0 => weight / total_weight,
                _ => 0.0,
            };

            AxisContribution {
                axis: *axis,
                mean: *mean,
                weight,
                effective_weight,
                contribution: mean.map(|m| m * effective_weight).unwrap_or(0.0),
                excluded: mean.is_none(),
                std_dev: summary.std_dev(*axis),
                unstable: unstable.contains(axis),
            }
        })
        .collect();

    let rqi = if total_weight > 0.0 {
        Some(
            contributions
                .iter()
                .map(|c| c.contribution)
                .sum::<f64>()
                .clamp(0.0, 1.0),
        )
    } else {
        None
    };

    let bottleneck = bottleneck(&means);

    let facts: Vec<AxisFacts> = contributions
        .iter()
        .map(|c| AxisFacts {
            axis: c.axis,
            mean: c.mean,
            std_dev: c.std_dev,
            unstable: c.unstable,
        })
        .collect();

    let instability_threshold = match summary {
        EvaluationSummary::Reconciled(reconciled) => Some(reconciled.instability_threshold),
        EvaluationSummary::Run(_) => None,
    };

    RqiReport {
        rqi,
        grade: thresholds.grade(rqi),
        contributions,
        bottleneck,
        justification: justification::justify(
            &facts,
            bottleneck,
            instability_threshold,
            Coverage {
                runs: summary.run_count(),
                skipped: summary.skipped(),
            },
        ),
        source: summary.source(),
    }
}
