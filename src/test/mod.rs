//! Robust hypothesis testing over metric tables.

mod battery;

pub use battery::{robust_test, MetricLocationTest};
pub use signed_rank::{signed_rank_test, Alternative, WilcoxonTest};
