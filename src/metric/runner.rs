//! Applying the metric catalogue to a community matrix.

use crate::data::MetricTable;
use crate::error::{PhyloError, Result};
use crate::metric::MetricContext;
use crate::registry::MetricRegistry;

/// Apply the selected metrics to every quadrat of the context's matrix.
///
/// `subset` of `None` runs the full catalogue; any selection always includes
/// `richness` as the first column (registry guarantee). Requesting a
/// tree-dependent metric against a context prepared without a tree is a
/// resolve-time failure, since no row could ever produce a value; anything a
/// single row cannot support (e.g. pairwise distance for a singleton quadrat)
/// is a NaN cell, never a batch failure.
pub fn run_metrics(ctx: &MetricContext, subset: Option<&[String]>) -> Result<MetricTable> {
    let registry = MetricRegistry::builtin();
    let entries = registry.resolve(subset)?;

    if !ctx.has_tree() {
        if let Some(entry) = entries.iter().find(|e| e.needs_tree) {
            return Err(PhyloError::InvalidParameter(format!(
                "metric '{}' needs a phylogenetic tree but the context has none",
                entry.name
            )));
        }
    }

    let cdm = ctx.cdm();
    let metric_names: Vec<String> = entries.iter().map(|e| e.name.to_string()).collect();
    let values: Vec<Vec<f64>> = (0..cdm.n_quadrats())
        .map(|row| entries.iter().map(|e| (e.func)(ctx, row)).collect())
        .collect();

    MetricTable::new(cdm.quadrat_ids().to_vec(), metric_names, values)
}
