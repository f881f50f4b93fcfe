//! Run aggregation, multi-run reconciliation and the composite index

pub mod justification;
mod reconciler;
mod rqi_engine;
mod run_aggregator;
pub mod statistics;

pub use reconciler::{Reconciler, DEFAULT_INSTABILITY_THRESHOLD};
pub use rqi_engine::{bottleneck, compute as compute_rqi};
pub use run_aggregator::{EvalConfig, RunAggregator, DEFAULT_MAX_CONCURRENCY};
