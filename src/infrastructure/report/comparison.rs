use std::collections::BTreeMap;

use super::ReportError;
use crate::domain::evaluation::{EvaluationReport, RqiWeights};
use crate::domain::scoring::Axis;
use crate::infrastructure::evaluation::statistics;

/// Label for reports generated without a prompt version
pub const UNVERSIONED: &str = "unversioned";

fn cell(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn delta_cell(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:+.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Side-by-side table of RQI, grade and axis means across reports
pub fn comparison_table(reports: &[EvaluationReport]) -> String {
    let mut lines = vec![
        format!(
            "{:<24} {:<14} {:<24} {:>6} {:<18} {:>10} {:>11} {:>10} {:>9}",
            "run", "provider", "model", "rqi", "grade", "retrieval", "factuality", "reasoning",
            "failures"
        ),
        "-".repeat(134),
    ];

    for report in reports {
        let failures: usize = Axis::ALL.iter().map(|a| report.failure_count(*a)).sum();

        lines.push(format!(
            "{:<24} {:<14} {:<24} {:>6} {:<18} {:>10} {:>11} {:>10} {:>9}",
            report.run_name,
            report.config.provider,
            report.config.model,
            cell(report.rqi.rqi),
            report.rqi.grade.as_str(),
            cell(report.axis_mean(Axis::Retrieval)),
            cell(report.axis_mean(Axis::Factuality)),
            cell(report.axis_mean(Axis::Reasoning)),
            failures,
        ));
    }

    if let Some(best) = reports
        .iter()
        .filter_map(|r| r.rqi.rqi.map(|rqi| (r, rqi)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
    {
        lines.push(String::new());
        lines.push(format!("best: {} (rqi {:.2})", best.0.run_name, best.1));
    }

    lines.join("\n") + "\n"
}

/// One question's scores under one prompt version
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionScores {
    pub axes: BTreeMap<Axis, f64>,
    /// Weighted over the axes with data, using the report's RQI weights
    pub rqi: Option<f64>,
}

impl QuestionScores {
    pub fn axis(&self, axis: Axis) -> Option<f64> {
        self.axes.get(&axis).copied()
    }
}

/// Report-level averages for one prompt version
#[derive(Debug, Clone, PartialEq)]
pub struct VersionSummary {
    pub version: String,
    pub reports: usize,
    pub rqi: Option<f64>,
    pub axes: BTreeMap<Axis, f64>,
}

/// Per-question impact of prompt versions, measured against a baseline
#[derive(Debug, Clone, PartialEq)]
pub struct PromptVersionComparison {
    pub baseline: String,
    pub versions: Vec<VersionSummary>,
    /// question id -> prompt version -> scores
    pub questions: BTreeMap<String, BTreeMap<String, QuestionScores>>,
}

impl PromptVersionComparison {
    /// Group reports by prompt version; the baseline defaults to the first
    /// version in sort order
    pub fn build(
        reports: &[EvaluationReport],
        baseline: Option<&str>,
    ) -> Result<Self, ReportError> {
        let mut groups: BTreeMap<String, Vec<&EvaluationReport>> = BTreeMap::new();
        for report in reports {
            let version = report
                .config
                .prompt_version
                .clone()
                .unwrap_or_else(|| UNVERSIONED.to_string());
            groups.entry(version).or_default().push(report);
        }

        let baseline = match baseline {
            Some(version) if groups.contains_key(version) => version.to_string(),
            Some(version) => {
                return Err(ReportError::UnknownBaseline {
                    version: version.to_string(),
                    available: groups.keys().cloned().collect::<Vec<_>>().join(", "),
                });
            }
            None => groups.keys().next().cloned().ok_or(ReportError::NoReports)?,
        };

        let versions = groups
            .iter()
            .map(|(version, group)| summarize_version(version, group))
            .collect();

        let mut questions: BTreeMap<String, BTreeMap<String, QuestionScores>> = BTreeMap::new();
        for (version, group) in &groups {
            let weights = weights_of(group[0]);
            for (question_id, axes) in question_axis_means(group) {
                let rqi = weighted(&axes, &weights);
                questions
                    .entry(question_id)
                    .or_default()
                    .insert(version.clone(), QuestionScores { axes, rqi });
            }
        }

        Ok(Self {
            baseline,
            versions,
            questions,
        })
    }

    pub fn scores(&self, question_id: &str, version: &str) -> Option<&QuestionScores> {
        self.questions.get(question_id)?.get(version)
    }

    /// Question RQI under `version` minus the baseline's
    pub fn rqi_delta(&self, question_id: &str, version: &str) -> Option<f64> {
        let current = self.scores(question_id, version)?.rqi?;
        let base = self.scores(question_id, &self.baseline)?.rqi?;
        Some(current - base)
    }

    /// Axis score under `version` minus the baseline's
    pub fn axis_delta(&self, question_id: &str, version: &str, axis: Axis) -> Option<f64> {
        let current = self.scores(question_id, version)?.axis(axis)?;
        let base = self.scores(question_id, &self.baseline)?.axis(axis)?;
        Some(current - base)
    }

    /// Version summary, question x version RQI pivot, then per-question deltas
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!(
                "{:<20} {:>7} {:>6} {:>10} {:>11} {:>10}",
                "prompt version", "reports", "rqi", "retrieval", "factuality", "reasoning"
            ),
            "-".repeat(69),
        ];
        for summary in &self.versions {
            lines.push(format!(
                "{:<20} {:>7} {:>6} {:>10} {:>11} {:>10}",
                summary.version,
                summary.reports,
                cell(summary.rqi),
                cell(summary.axes.get(&Axis::Retrieval).copied()),
                cell(summary.axes.get(&Axis::Factuality).copied()),
                cell(summary.axes.get(&Axis::Reasoning).copied()),
            ));
        }

        lines.push(String::new());
        let header = self
            .versions
            .iter()
            .map(|v| format!("{:>14}", v.version))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("{:<16} {}", "question (rqi)", header));
        for (question_id, by_version) in &self.questions {
            let row = self
                .versions
                .iter()
                .map(|v| format!("{:>14}", cell(by_version.get(&v.version).and_then(|s| s.rqi))))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(format!("{:<16} {}", question_id, row));
        }

        lines.push(String::new());
        let rqi_delta = format!("rqi_delta_vs_{}", self.baseline);
        let reasoning_delta = format!("reasoning_delta_vs_{}", self.baseline);
        lines.push(format!(
            "{:<16} {:<20} {:>6} {:>10} {:>11} {:>10} {:>w1$} {:>w2$}",
            "question",
            "prompt version",
            "rqi",
            "retrieval",
            "factuality",
            "reasoning",
            rqi_delta,
            reasoning_delta,
            w1 = rqi_delta.len(),
            w2 = reasoning_delta.len(),
        ));
        for (question_id, by_version) in &self.questions {
            for (version, scores) in by_version {
                lines.push(format!(
                    "{:<16} {:<20} {:>6} {:>10} {:>11} {:>10} {:>w1$} {:>w2$}",
                    question_id,
                    version,
                    cell(scores.rqi),
                    cell(scores.axis(Axis::Retrieval)),
                    cell(scores.axis(Axis::Factuality)),
                    cell(scores.axis(Axis::Reasoning)),
                    delta_cell(self.rqi_delta(question_id, version)),
                    delta_cell(self.axis_delta(question_id, version, Axis::Reasoning)),
                    w1 = rqi_delta.len(),
                    w2 = reasoning_delta.len(),
                ));
            }
        }

        lines.join("\n") + "\n"
    }
}

fn summarize_version(version: &str, group: &[&EvaluationReport]) -> VersionSummary {
    let rqis: Vec<f64> = group.iter().filter_map(|r| r.rqi.rqi).collect();
    let axes = Axis::ALL
        .iter()
        .filter_map(|axis| {
            let means: Vec<f64> = group.iter().filter_map(|r| r.axis_mean(*axis)).collect();
            statistics::mean(&means).map(|m| (*axis, m))
        })
        .collect();

    VersionSummary {
        version: version.to_string(),
        reports: group.len(),
        rqi: statistics::mean(&rqis),
        axes,
    }
}

fn weights_of(report: &EvaluationReport) -> RqiWeights {
    let weight = |axis: Axis| report.rqi.contribution(axis).map(|c| c.weight);
    match (
        weight(Axis::Retrieval),
        weight(Axis::Factuality),
        weight(Axis::Reasoning),
    ) {
        (Some(retrieval), Some(factuality), Some(reasoning)) => {
            RqiWeights::new(retrieval, factuality, reasoning)
        }
        _ => RqiWeights::default(),
    }
}

/// Mean scored value per question and axis over every run of the group
fn question_axis_means(group: &[&EvaluationReport]) -> BTreeMap<String, BTreeMap<Axis, f64>> {
    let mut samples: BTreeMap<String, BTreeMap<Axis, Vec<f64>>> = BTreeMap::new();

    for run in group.iter().flat_map(|r| &r.runs) {
        for axis in Axis::ALL {
            for entry in run.entries_for(axis) {
                if let Some(score) = entry.score() {
                    samples
                        .entry(entry.question_id.clone())
                        .or_default()
                        .entry(axis)
                        .or_default()
                        .push(score);
                }
            }
        }
    }

    samples
        .into_iter()
        .map(|(question_id, axes)| {
            let means = axes
                .into_iter()
                .filter_map(|(axis, scores)| statistics::mean(&scores).map(|m| (axis, m)))
                .collect();
            (question_id, means)
        })
        .collect()
}

fn weighted(axes: &BTreeMap<Axis, f64>, weights: &RqiWeights) -> Option<f64> {
    let total: f64 = axes.keys().map(|axis| weights.weight(*axis)).sum();
    if total <= 0.0 {
        return None;
    }

    Some(
        axes.iter()
            .map(|(axis, score)| score * weights.weight(*axis) / total)
            .sum::<f64>()
            .clamp(0.0, 1.0),
    )
}
