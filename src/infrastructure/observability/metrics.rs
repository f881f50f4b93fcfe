//! Prometheus metrics for evaluation runs

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;
use crate::domain::resilience::FailureKind;
use crate::domain::scoring::{Axis, EvalErrorKind};

pub const CALL_ATTEMPTS_TOTAL: &str = "rqi_call_attempts_total";
pub const CALL_RETRIES_TOTAL: &str = "rqi_call_retries_total";
pub const CALL_FAILURES_TOTAL: &str = "rqi_call_failures_total";
pub const QUESTION_DURATION_SECONDS: &str = "rqi_question_duration_seconds";
pub const AXIS_FAILURES_TOTAL: &str = "rqi_axis_failures_total";

/// Handle to the installed Prometheus recorder
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Metrics in Prometheus text exposition format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

/// Install the global Prometheus recorder
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::debug!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe_metrics();
            gauge!("rqi_eval_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

fn describe_metrics() {
    describe_counter!(CALL_ATTEMPTS_TOTAL, "External model call attempts");
    describe_counter!(CALL_RETRIES_TOTAL, "Retries scheduled after a retryable failure");
    describe_counter!(CALL_FAILURES_TOTAL, "External calls that failed after the retry policy");
    describe_histogram!(QUESTION_DURATION_SECONDS, "Wall-clock time per question pipeline");
    describe_counter!(AXIS_FAILURES_TOTAL, "Per-question axis failures by error kind");
}

pub fn record_call_attempt(operation: &str) {
    counter!(CALL_ATTEMPTS_TOTAL, "operation" => operation.to_string()).increment(1);
}

pub fn record_call_retry(operation: &str, kind: FailureKind) {
    counter!(
        CALL_RETRIES_TOTAL,
        "operation" => operation.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

pub fn record_call_failure(operation: &str, kind: EvalErrorKind) {
    counter!(
        CALL_FAILURES_TOTAL,
        "operation" => operation.to_string(),
        "error" => kind.to_string()
    )
    .increment(1);
}

pub fn record_question_duration(duration: Duration) {
    histogram!(QUESTION_DURATION_SECONDS).record(duration.as_secs_f64());
}

pub fn record_axis_failure(axis: Axis, kind: EvalErrorKind) {
    counter!(
        AXIS_FAILURES_TOTAL,
        "axis" => axis.as_str(),
        "error" => kind.to_string()
    )
    .increment(1);
}
