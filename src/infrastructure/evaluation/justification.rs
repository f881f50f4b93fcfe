//! Rule-based diagnostic text for RQI reports

use crate::domain::evaluation::RECOMMENDED_MIN_RUNS;
use crate::domain::scoring::Axis;

/// Axis means below this are reported as weak
pub const LOW_SCORE: f64 = 0.6;
/// Axis means above this are reported as healthy
pub const HIGH_SCORE: f64 = 0.8;
/// Retrieval above this with reasoning below this is the RAG paradox
pub const PARADOX_RETRIEVAL: f64 = 0.8;
pub const PARADOX_REASONING: f64 = 0.5;

/// Fixed diagnostic for the bottleneck axis
pub fn diagnostic(axis: Axis) -> &'static str {
    match axis {
        Axis::Retrieval => {
            "retrieval is the bottleneck: embedding/index quality should be improved"
        }
        Axis::Factuality => "generation is not honoring required constraints",
        Axis::Reasoning => "judge-assessed faithfulness/relevancy is weak",
    }
}

fn health(axis: Axis, mean: f64) -> String {
    let verdict = match axis {
        Axis::Retrieval if mean < LOW_SCORE => "relevant documents are often not retrieved",
        Axis::Retrieval => "the right context is consistently found",
        Axis::Factuality if mean < LOW_SCORE => {
            "required keywords are missed; answers may be hallucinated or over-summarised"
        }
        Axis::Factuality if mean > HIGH_SCORE => "required keywords and figures are included",
        Axis::Factuality => "required keywords are partially included",
        Axis::Reasoning if mean < LOW_SCORE => {
            "the judge found answers unfaithful or irrelevant"
        }
        Axis::Reasoning if mean > HIGH_SCORE => "answers are faithful and relevant",
        Axis::Reasoning => "answers are mostly faithful and relevant",
    };

    let status = if mean < LOW_SCORE {
        "weak"
    } else if mean > HIGH_SCORE {
        "healthy"
    } else {
        "fair"
    };

    format!("{} {:.2} ({}): {}", axis, mean, status, verdict)
}

/// Per-axis inputs to the justification
#[derive(Debug, Clone, Copy)]
pub struct AxisFacts {
    pub axis: Axis,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub unstable: bool,
}

/// How much evidence the score rests on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub runs: usize,
    /// Questions left unevaluated by a cancelled run
    pub skipped: usize,
}

/// Build justification lines in a fixed order: bottleneck, health, exclusions,
/// instability, paradox, coverage
pub fn justify(
    facts: &[AxisFacts],
    bottleneck: Option<Axis>,
    instability_threshold: Option<f64>,
    coverage: Coverage,
) -> Vec<String> {
    let mut lines = Vec::new();

    match bottleneck {
        Some(axis) => lines.push(format!("bottleneck: {} - {}", axis, diagnostic(axis))),
        None => lines.push("no axis produced data; RQI cannot be computed".to_string()),
    }

    lines.extend(
        facts
            .iter()
            .filter_map(|f| f.mean.map(|mean| health(f.axis, mean))),
    );

    lines.extend(
        facts
            .iter()
            .filter(|f| f.mean.is_none())
            .map(|f| format!("{} excluded: no data", f.axis)),
    );

    for fact in facts.iter().filter(|f| f.unstable) {
        let sd = fact.std_dev.unwrap_or_default();
        match instability_threshold {
            Some(threshold) => lines.push(format!(
                "warning: {} is unstable across runs (std dev {:.3} > {:.3})",
                fact.axis, sd, threshold
            )),
            None => lines.push(format!(
                "warning: {} is unstable across runs (std dev {:.3})",
                fact.axis, sd
            )),
        }
    }

    let mean_of = |axis: Axis| facts.iter().find(|f| f.axis == axis).and_then(|f| f.mean);
    if let (Some(retrieval), Some(reasoning)) = (mean_of(Axis::Retrieval), mean_of(Axis::Reasoning))
    {
        if retrieval > PARADOX_RETRIEVAL && reasoning < PARADOX_REASONING {
            lines.push(
                "warning: RAG paradox - retrieval is good but reasoning is poor; the model has \
                 the context but fails to synthesize it, try a stronger generator"
                    .to_string(),
            );
        }
    }

    let plural = if coverage.runs == 1 { "" } else { "s" };
    lines.push(format!("based on {} run{}", coverage.runs, plural));
    if coverage.runs < RECOMMENDED_MIN_RUNS {
        lines.push(format!(
            "warning: fewer than {} runs; the score has no spread estimate and may not repeat",
            RECOMMENDED_MIN_RUNS
        ));
    }
    if coverage.skipped > 0 {
        lines.push(format!(
            "warning: run was cancelled; {} question(s) were not evaluated",
            coverage.skipped
        ));
    }

    lines
}
