//! OpenTelemetry distributed tracing setup

use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::config::TracingConfig;
use crate::infrastructure::logging::{self, LoggingConfig};

/// Installed tracing pipeline; keep it alive until the process exits
#[derive(Debug, Default)]
pub struct TracingGuard {
    provider: Option<TracerProvider>,
}

impl TracingGuard {
    pub fn exporting(&self) -> bool {
        self.provider.is_some()
    }
}

/// Initialize tracing with optional OpenTelemetry export
///
/// Export failures are not fatal: logging still comes up and a warning is
/// emitted.
pub fn init_tracing(
    logging_config: &LoggingConfig,
    tracing_config: &TracingConfig,
) -> Result<TracingGuard, tracing_subscriber::util::TryInitError> {
    let filter = logging::env_filter(&logging_config.level);

    let (provider, otel_error) = if tracing_config.enabled {
        match init_otel_tracing(tracing_config) {
            Ok(provider) => (Some(provider), None),
            Err(e) => (None, Some(e)),
        }
    } else {
        (None, None)
    };

    let telemetry_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer("rqi-eval"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(logging::fmt_layer(logging_config.format))
        .with(telemetry_layer)
        .try_init()?;

    match (&provider, otel_error) {
        (Some(_), _) => tracing::info!(
            "Tracing initialized with OpenTelemetry export to {}",
            tracing_config.otlp_endpoint
        ),
        (None, Some(e)) => tracing::warn!(
            "Failed to initialize OpenTelemetry: {}. Tracing export disabled.",
            e
        ),
        (None, None) => tracing::debug!("Logging initialized with level: {}", logging_config.level),
    }

    Ok(TracingGuard { provider })
}

fn init_otel_tracing(
    config: &TracingConfig,
) -> Result<TracerProvider, opentelemetry::trace::TraceError> {
    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        config.service_name.clone(),
    )]);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_sampler(sampler(config.sampling_ratio))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .with_batch_exporter(exporter, runtime::Tokio)
        .build();

    Ok(provider)
}

fn sampler(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(ratio)
    }
}

/// Flush pending spans
pub fn shutdown_tracing(guard: TracingGuard) {
    if let Some(provider) = guard.provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!("Failed to flush traces: {}", e);
        }
    }
}
