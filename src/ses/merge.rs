//! Joining observed metrics with null-distribution summaries.

use crate::data::{GroupBy, GroupKey, MetricTable, RICHNESS};
use crate::error::{PhyloError, Result};
use crate::summarize::{MetricSummary, SummaryTable};
use serde::{Deserialize, Serialize};

/// Observed metrics joined with their matching summary rows, one row per
/// observed quadrat.
///
/// The join is total and loud: every observed row must find exactly one
/// summary key, or the merge fails with `UnmatchedGroupingKey`. Silently
/// dropping rows here would bias every significance call downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedTable {
    group_by: GroupBy,
    metric_names: Vec<String>,
    quadrat_ids: Vec<String>,
    keys: Vec<GroupKey>,
    observed: Vec<Vec<f64>>,
    summary: Vec<Vec<MetricSummary>>,
}

impl MergedTable {
    /// Grouping mode the join was made on.
    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    /// Metric columns carried through the join.
    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    /// Quadrat identifiers, in observed row order.
    pub fn quadrat_ids(&self) -> &[String] {
        &self.quadrat_ids
    }

    /// The grouping key each row joined on.
    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.observed.len()
    }

    /// Observed value at (row, metric column).
    pub fn observed(&self, row: usize, metric: usize) -> f64 {
        self.observed[row][metric]
    }

    /// Matched summary cell at (row, metric column).
    pub fn summary(&self, row: usize, metric: usize) -> &MetricSummary {
        &self.summary[row][metric]
    }

    /// Assemble a merged table from raw parts, bypassing the join. Test-only:
    /// lets classification tests pin exact bounds.
    #[cfg(test)]
    pub(crate) fn from_parts_for_tests(
        group_by: GroupBy,
        metric_names: Vec<String>,
        quadrat_ids: Vec<String>,
        keys: Vec<GroupKey>,
        observed: Vec<Vec<f64>>,
        summary: Vec<Vec<MetricSummary>>,
    ) -> Self {
        Self {
            group_by,
            metric_names,
            quadrat_ids,
            keys,
            observed,
            summary,
        }
    }
}

/// Join an observed metric table with a summary table on the summary's
/// grouping key.
///
/// Carried metric columns are those present in both tables, in observed
/// order. Under richness grouping the `richness` column itself is the key,
/// not a response, and is excluded; under quadrat grouping it is carried
/// like any other metric (a null model need not preserve it).
pub fn merge_observed(observed: &MetricTable, summary: &SummaryTable) -> Result<MergedTable> {
    let group_by = summary.group_by();
    let metric_names: Vec<String> = observed
        .metric_names()
        .iter()
        .filter(|name| summary.metric_names().contains(name))
        .filter(|name| !(group_by == GroupBy::Richness && name.as_str() == RICHNESS))
        .cloned()
        .collect();
    if metric_names.is_empty() {
        return Err(PhyloError::EmptyData(
            "no shared metric columns between observed and summary tables".to_string(),
        ));
    }
    let observed_cols: Vec<usize> = metric_names
        .iter()
        .map(|name| {
            observed
                .metric_index(name)
                .expect("column was selected from the observed table")
        })
        .collect();
    let summary_cols: Vec<usize> = metric_names
        .iter()
        .map(|name| {
            summary
                .metric_names()
                .iter()
                .position(|m| m == name)
                .expect("column was selected from the summary table")
        })
        .collect();

    let mut keys = Vec::with_capacity(observed.n_rows());
    let mut observed_values = Vec::with_capacity(observed.n_rows());
    let mut summary_values = Vec::with_capacity(observed.n_rows());
    for row in 0..observed.n_rows() {
        let key = observed.group_key(row, group_by);
        let summary_row = summary
            .row_for(&key)
            .ok_or_else(|| PhyloError::UnmatchedGroupingKey(key.to_string()))?;
        observed_values.push(
            observed_cols
                .iter()
                .map(|&col| observed.value(row, col))
                .collect::<Vec<f64>>(),
        );
        summary_values.push(
            summary_cols
                .iter()
                .map(|&col| summary_row[col])
                .collect::<Vec<MetricSummary>>(),
        );
        keys.push(key);
    }

    Ok(MergedTable {
        group_by,
        metric_names,
        quadrat_ids: observed.quadrat_ids().to_vec(),
        keys,
        observed: observed_values,
        summary: summary_values,
    })
}
