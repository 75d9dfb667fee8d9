//! Metric evaluation: prepared context, built-in metrics, and the runner.

pub mod builtin;
mod context;
mod runner;

pub use context::MetricContext;
pub use runner::run_metrics;
