//! CLI module for RQI Eval
//!
//! Provides subcommands:
//! - `run`: evaluate a RAG pipeline and write a report
//! - `compare`: compare report artifacts side by side

pub mod compare;
pub mod run;

use clap::{Parser, Subcommand};

/// RQI Eval - RAG Quality Index evaluation engine
#[derive(Parser)]
#[command(name = "rqi-eval")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the question set through the pipeline and write a report
    Run(run::RunArgs),

    /// Print an A/B comparison of report files
    Compare(compare::CompareArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "rqi-eval",
            "run",
            "--provider",
            "groq",
            "--run-name",
            "groq_70b",
            "--runs",
            "3",
        ])
        .unwrap();

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.provider, "groq");
                assert_eq!(args.run_name, "groq_70b");
                assert_eq!(args.runs, Some(3));
                assert!(args.judge_provider.is_none());
                assert!(!args.metrics_out);
            }
            Command::Compare(_) => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_compare_command() {
        let cli = Cli::try_parse_from(["rqi-eval", "compare", "a.json", "b.json"]).unwrap();

        match cli.command {
            Command::Compare(args) => assert_eq!(args.reports.len(), 2),
            Command::Run(_) => panic!("expected compare command"),
        }
    }

    #[test]
    fn test_parse_compare_with_baseline() {
        let cli = Cli::try_parse_from([
            "rqi-eval",
            "compare",
            "a.json",
            "b.json",
            "--baseline",
            "prompt_v0",
        ])
        .unwrap();

        match cli.command {
            Command::Compare(args) => {
                assert_eq!(args.baseline.as_deref(), Some("prompt_v0"));
                assert!(!args.by_prompt_version);
            }
            Command::Run(_) => panic!("expected compare command"),
        }
    }

    #[test]
    fn test_run_requires_provider() {
        assert!(Cli::try_parse_from(["rqi-eval", "run", "--run-name", "x"]).is_err());
    }
}
