//! Standardized effect sizes and significance classification.

pub(crate) mod classify;
pub(crate) mod merge;
pub(crate) mod standardize;

pub use classify::{classify, Significance, SignificanceTable};
pub use merge::{merge_observed, MergedTable};
pub use standardize::{standardize, SesTable};
