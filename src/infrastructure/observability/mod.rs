//! Observability infrastructure - Tracing and Metrics

mod config;
mod metrics;
mod tracing_setup;

pub use config::{MetricsConfig, ObservabilityConfig, TracingConfig};
pub use metrics::{
    init_metrics, record_axis_failure, record_call_attempt, record_call_failure,
    record_call_retry, record_question_duration, PrometheusMetrics, AXIS_FAILURES_TOTAL,
    CALL_ATTEMPTS_TOTAL, CALL_FAILURES_TOTAL, CALL_RETRIES_TOTAL, QUESTION_DURATION_SECONDS,
};
pub use tracing_setup::{init_tracing, shutdown_tracing, TracingGuard};
