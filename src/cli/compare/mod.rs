//! Compare command - A/B table across saved reports

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::infrastructure::report::{comparison_table, load_report, PromptVersionComparison};

/// Arguments for the compare command
#[derive(Args, Clone, Debug)]
pub struct CompareArgs {
    /// Report files (report_<run_name>.json)
    #[arg(required = true)]
    pub reports: Vec<PathBuf>,

    /// Also compare questions across prompt versions
    #[arg(long)]
    pub by_prompt_version: bool,

    /// Prompt version the deltas are measured against (implies --by-prompt-version)
    #[arg(long)]
    pub baseline: Option<String>,
}

impl CompareArgs {
    fn wants_prompt_versions(&self) -> bool {
        self.by_prompt_version || self.baseline.is_some()
    }
}

/// Load every report and print them side by side
pub async fn run(args: CompareArgs) -> anyhow::Result<()> {
    let mut reports = Vec::with_capacity(args.reports.len());

    for path in &args.reports {
        let report = load_report(path)
            .await
            .with_context(|| format!("Failed to load report {}", path.display()))?;
        reports.push(report);
    }

    print!("{}", comparison_table(&reports));

    if args.wants_prompt_versions() {
        let comparison = PromptVersionComparison::build(&reports, args.baseline.as_deref())?;
        println!();
        print!("{}", comparison.render());
    }

    Ok(())
}
