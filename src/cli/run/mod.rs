//! Run command - evaluate a RAG pipeline and write one report

mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{AppConfig, RetrieverConfig};
use crate::domain::evaluation::{
    ConfigSnapshot, EvaluationReport, EvaluationSummary, RunSummary, RECOMMENDED_MIN_RUNS,
};
use crate::domain::judge::Judge;
use crate::domain::retrieval::Retriever;
use crate::domain::scoring::Scorer;
use crate::infrastructure::evaluation::{compute_rqi, EvalConfig, Reconciler, RunAggregator};
use crate::infrastructure::generation::RagGenerator;
use crate::infrastructure::judge::LlmJudge;
use crate::infrastructure::llm::{HttpClient, ProviderRegistry};
use crate::infrastructure::observability::{init_metrics, init_tracing, shutdown_tracing};
use crate::infrastructure::question::load_question_set;
use crate::infrastructure::report::{validate_run_name, ReportWriter};
use crate::infrastructure::resilience::ResilientCaller;
use crate::infrastructure::retrieval::{FixtureRetriever, HttpRetriever};
use crate::infrastructure::scoring::{FactualityScorer, ReasoningScorer, RetrievalRecallScorer};

pub use output::render_report;

/// Arguments for the run command
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Registry name of the generation provider (openai, groq, grok, gemini, anthropic, ...)
    #[arg(long)]
    pub provider: String,

    /// Name of this evaluation; the report is saved as report_<run-name>.json
    #[arg(long)]
    pub run_name: String,

    /// Question set file (overrides config)
    #[arg(long)]
    pub questions: Option<PathBuf>,

    /// Number of runs to reconcile (overrides config)
    #[arg(long)]
    pub runs: Option<usize>,

    /// Provider used for the LLM judge; defaults to the generation provider
    #[arg(long)]
    pub judge_provider: Option<String>,

    /// Results directory (overrides config)
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Maximum questions in flight (overrides config)
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Write a Prometheus metrics snapshot next to the report
    #[arg(long)]
    pub metrics_out: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(questions) = &self.questions {
            config.evaluation.questions = questions.clone();
        }
        if let Some(runs) = self.runs {
            config.evaluation.runs = runs;
        }
        if let Some(results_dir) = &self.results_dir {
            config.evaluation.results_dir = results_dir.clone();
        }
        if let Some(max_concurrency) = self.max_concurrency {
            config.evaluation.max_concurrency = max_concurrency;
        }
        if let Some(judge_provider) = &self.judge_provider {
            config.judge.provider = Some(judge_provider.clone());
        }
    }
}

/// Run the evaluation
///
/// Errors returned from here are run-level failures and exit non-zero;
/// per-question failures only show up in the report.
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate()?;

    let guard = init_tracing(&config.logging, &config.observability.tracing)?;
    let metrics = init_metrics(&config.observability.metrics);

    let result = evaluate(&args, &config).await;

    if let (Ok(report), Some(metrics)) = (&result, &metrics) {
        if args.metrics_out {
            let writer = ReportWriter::new(&config.evaluation.results_dir);
            let path = writer.write_metrics(&report.run_name, &metrics.render()).await?;
            info!(path = %path.display(), "Metrics snapshot written");
        }
    }

    shutdown_tracing(guard);

    let report = result?;
    print!("{}", render_report(&report));

    Ok(())
}

async fn evaluate(args: &RunArgs, config: &AppConfig) -> anyhow::Result<EvaluationReport> {
    validate_run_name(&args.run_name)?;

    let questions = load_question_set(&config.evaluation.questions).await?;
    let aggregator = build_aggregator(args, config).await?;
    let writer = ReportWriter::new(&config.evaluation.results_dir);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let runs = config.evaluation.runs;
    if runs < RECOMMENDED_MIN_RUNS {
        warn!(
            runs,
            recommended = RECOMMENDED_MIN_RUNS,
            "Fewer runs than recommended; the score will carry no spread estimate"
        );
    }

    let mut summaries: Vec<RunSummary> = Vec::with_capacity(runs);

    for index in 0..runs {
        let run_name = if runs > 1 {
            format!("{}-{}", args.run_name, index + 1)
        } else {
            args.run_name.clone()
        };

        let summary = aggregator.run(&questions, &run_name, &cancel).await?;
        summaries.push(summary);

        if cancel.is_cancelled() {
            warn!(completed = summaries.len(), requested = runs, "Stopping after cancellation");
            break;
        }
    }

    let complete = complete_runs(&summaries);
    if complete.len() < summaries.len() {
        warn!(
            excluded = summaries.len() - complete.len(),
            "Leaving the cancelled partial run out of reconciliation"
        );
    }

    let reconciled = if complete.len() >= 2 {
        Some(Reconciler::new(config.evaluation.instability_threshold).reconcile(&complete)?)
    } else {
        None
    };

    let single = complete.first().or(summaries.first());
    let source = match (&reconciled, single) {
        (Some(reconciled), _) => EvaluationSummary::Reconciled(reconciled),
        (None, Some(run)) => EvaluationSummary::Run(run),
        (None, None) => anyhow::bail!("No run completed"),
    };

    let rqi = compute_rqi(source, &config.evaluation.weights, &config.evaluation.grading);
    let report = EvaluationReport::new(&args.run_name, summaries, reconciled, rqi);

    writer.write(&report).await?;

    Ok(report)
}

/// Runs that covered the whole question set
fn complete_runs(summaries: &[RunSummary]) -> Vec<RunSummary> {
    summaries.iter().filter(|r| !r.cancelled).cloned().collect()
}

async fn build_aggregator(args: &RunArgs, config: &AppConfig) -> anyhow::Result<RunAggregator> {
    let registry = ProviderRegistry::builtin()
        .with_overrides(&config.providers)
        .with_request_timeout(config.retry.attempt_timeout());

    let generation_provider = registry.create(&args.provider)?;

    let judge_name = config
        .judge
        .provider
        .clone()
        .unwrap_or_else(|| args.provider.clone());
    let judge_provider = if judge_name == generation_provider.name {
        generation_provider.clone()
    } else {
        registry.create(&judge_name)?
    };
    let judge_model = config
        .judge
        .model
        .clone()
        .unwrap_or_else(|| judge_provider.model.clone());

    let mut judge = LlmJudge::new(judge_provider.provider.clone(), judge_model.clone());
    if let Some(template) = &config.judge.prompt_template {
        judge = judge.with_prompt_template(template.clone());
    }
    let judge: Arc<dyn Judge> = Arc::new(judge);

    let retriever = build_retriever(&config.retriever).await?;
    let caller = Arc::new(ResilientCaller::new(config.retry.clone()));

    let generator = RagGenerator::new(generation_provider, caller.clone())
        .with_settings(config.generation.clone());

    let scorers: Vec<Arc<dyn Scorer>> = vec![
        Arc::new(RetrievalRecallScorer::new()),
        Arc::new(FactualityScorer::new()),
        Arc::new(
            ReasoningScorer::new(judge, caller)
                .with_weights(config.evaluation.reasoning_weights.clone()),
        ),
    ];

    let snapshot = ConfigSnapshot {
        provider: generator.provider_name().to_string(),
        model: generator.model().to_string(),
        judge_provider: judge_name,
        judge_model,
        retriever: retriever.retriever_name().to_string(),
        prompt_version: Some(generator.prompt_version().to_string()),
        question_set: Some(config.evaluation.questions.display().to_string()),
        max_concurrency: config.evaluation.max_concurrency,
        retry: config.retry.clone(),
        reasoning_weights: config.evaluation.reasoning_weights.clone(),
    };

    info!(
        provider = %snapshot.provider,
        model = %snapshot.model,
        judge = %snapshot.judge_provider,
        retriever = %snapshot.retriever,
        "Pipeline configured"
    );

    Ok(RunAggregator::new(
        retriever,
        Arc::new(generator),
        scorers,
        EvalConfig::new(config.evaluation.max_concurrency, snapshot),
    ))
}

async fn build_retriever(config: &RetrieverConfig) -> anyhow::Result<Arc<dyn Retriever>> {
    let retriever: Arc<dyn Retriever> = match config {
        RetrieverConfig::Http {
            endpoint,
            top_k,
            api_key_env,
        } => {
            let mut retriever = HttpRetriever::new(HttpClient::new(), endpoint.clone(), *top_k);
            if let Some(key) = api_key_env.as_ref().and_then(|var| std::env::var(var).ok()) {
                retriever = retriever.with_api_key(key);
            }
            Arc::new(retriever)
        }
        RetrieverConfig::Fixture { path } => Arc::new(
            FixtureRetriever::load(path)
                .await
                .with_context(|| format!("Failed to load retrieval fixture {}", path.display()))?,
        ),
    };

    Ok(retriever)
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if signal::ctrl_c().await.is_ok() {
        warn!("Received Ctrl+C; finishing in-flight questions");
        cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            provider: "groq".to_string(),
            run_name: "groq".to_string(),
            questions: Some(PathBuf::from("qs.json")),
            runs: Some(3),
            judge_provider: Some("openai".to_string()),
            results_dir: None,
            max_concurrency: Some(8),
            metrics_out: false,
        }
    }

    #[test]
    fn test_args_override_config() {
        let mut config = AppConfig::default();

        args().apply(&mut config);

        assert_eq!(config.evaluation.questions, PathBuf::from("qs.json"));
        assert_eq!(config.evaluation.runs, 3);
        assert_eq!(config.evaluation.max_concurrency, 8);
        assert_eq!(config.evaluation.results_dir, PathBuf::from("data/results"));
        assert_eq!(config.judge.provider.as_deref(), Some("openai"));
    }

    fn summary(name: &str) -> RunSummary {
        RunSummary::new(name, chrono::Utc::now(), 2, vec![], vec![], ConfigSnapshot::default())
    }

    #[test]
    fn test_cancelled_run_is_not_reconciled() {
        let summaries = vec![
            summary("groq-1"),
            summary("groq-2"),
            summary("groq-3").mark_cancelled(),
        ];

        let complete = complete_runs(&summaries);

        assert_eq!(complete.len(), 2);
        assert!(complete.iter().all(|r| !r.cancelled));
        assert_eq!(complete[1].run_name, "groq-2");
    }

    #[test]
    fn test_only_partial_run_leaves_nothing_to_reconcile() {
        let summaries = vec![summary("groq-1").mark_cancelled()];

        assert!(complete_runs(&summaries).is_empty());
    }

    #[tokio::test]
    async fn test_fixture_retriever_from_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("retrievals.json");
        tokio::fs::write(&path, r#"{"q1": [{"id": "doc-1", "content": "Paris"}]}"#)
            .await
            .unwrap();

        let retriever = build_retriever(&RetrieverConfig::Fixture { path }).await.unwrap();

        assert_eq!(retriever.retriever_name(), "fixture");
    }

    #[tokio::test]
    async fn test_missing_fixture_is_an_error() {
        let config = RetrieverConfig::Fixture {
            path: PathBuf::from("/nonexistent/retrievals.json"),
        };

        assert!(build_retriever(&config).await.is_err());
    }
}
