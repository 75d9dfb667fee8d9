//! Full-analysis composition and configuration.

mod runner;

pub use runner::{run_analysis, AnalysisConfig, AnalysisResult, NullOutcome};
