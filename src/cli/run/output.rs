use crate::domain::evaluation::EvaluationReport;
use crate::domain::scoring::Axis;

/// Human-readable report for stdout
pub fn render_report(report: &EvaluationReport) -> String {
    let rqi = &report.rqi;

    let mut lines = vec![
        format!("--- RAG Quality Index (RQI) Report: {} ---", report.run_name),
        format!(
            "provider: {} ({})  judge: {} ({})  runs: {}",
            report.config.provider,
            report.config.model,
            report.config.judge_provider,
            report.config.judge_model,
            report.runs.len()
        ),
        String::new(),
    ];

    for axis in Axis::ALL {
        let Some(contribution) = rqi.contribution(axis) else {
            continue;
        };

        let mean = contribution
            .mean
            .map(|m| format!("{:.2}", m))
            .unwrap_or_else(|| "no data".to_string());
        let spread = contribution
            .std_dev
            .map(|sd| format!(" ±{:.3}", sd))
            .unwrap_or_default();

        lines.push(format!(
            "{:<24} {:>7}{:<8} (weight {:.2}, failures {})",
            axis.label(),
            mean,
            spread,
            contribution.effective_weight,
            report.failure_count(axis)
        ));
    }

    lines.push("-".repeat(40));
    lines.push(match rqi.rqi {
        Some(value) => format!("Final RQI Score: {:.2} / 1.00", value),
        None => "Final RQI Score: n/a".to_string(),
    });
    lines.push(format!("System Grade:    {}", rqi.grade));

    if report.cancelled {
        lines.push(format!(
            "Cancelled: {} question(s) were not evaluated",
            report.skipped
        ));
    }

    lines.push(String::new());
    lines.push("Justification:".to_string());
    lines.extend(rqi.justification.iter().map(|line| format!("- {}", line)));

    lines.join("\n") + "\n"
}
