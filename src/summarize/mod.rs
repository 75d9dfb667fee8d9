//! Reducing replicate tables to per-group null distributions.

use crate::data::{GroupBy, GroupKey, ReplicateTable};
use crate::error::{PhyloError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeMap;

/// Null-distribution summary for one (grouping key, metric) cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Number of finite replicate values behind this summary.
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); NaN when n < 2.
    pub sd: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// One row per grouping-key value; per metric, the replicate distribution's
/// mean, sd, and two-sided confidence bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryTable {
    group_by: GroupBy,
    metric_names: Vec<String>,
    keys: Vec<GroupKey>,
    stats: Vec<Vec<MetricSummary>>,
}

impl SummaryTable {
    /// Grouping mode this table was built under.
    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    /// Metric column names, in column order.
    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    /// Grouping-key values, in row order (sorted).
    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    /// All summaries for one grouping key, aligned with `metric_names`.
    pub fn row_for(&self, key: &GroupKey) -> Option<&[MetricSummary]> {
        let idx = self.keys.iter().position(|k| k == key)?;
        Some(&self.stats[idx])
    }

    /// One summary cell by key and metric name.
    pub fn get(&self, key: &GroupKey, metric: &str) -> Option<&MetricSummary> {
        let col = self.metric_names.iter().position(|m| m == metric)?;
        self.row_for(key).map(|row| &row[col])
    }
}

/// Summarize one null model's replicate table.
///
/// Rows are grouped by the given mode (a row's own richness value, or its
/// quadrat identity) and every metric column is reduced per group to sample
/// mean, sample standard deviation, and a parametric two-sided confidence
/// interval `mean ± z(1 - alpha/2) * sd`. NaN replicate cells are excluded
/// from a group's sample; a group left with fewer than 2 values gets NaN sd
/// and bounds rather than failing, since rare richness levels across
/// replicates are expected.
pub fn summarize(
    table: &ReplicateTable,
    group_by: GroupBy,
    alpha: f64,
) -> Result<SummaryTable> {
    if table.is_empty() {
        return Err(PhyloError::EmptyData(
            "replicate table has no rows".to_string(),
        ));
    }
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(PhyloError::InvalidParameter(format!(
            "alpha must be in (0, 1), got {}",
            alpha
        )));
    }
    let normal = Normal::new(0.0, 1.0).expect("standard normal is well defined");
    let z = normal.inverse_cdf(1.0 - alpha / 2.0);

    let n_metrics = table.metric_names().len();
    let mut groups: BTreeMap<GroupKey, Vec<Vec<f64>>> = BTreeMap::new();
    for row in table.rows() {
        let key = table.group_key(row, group_by);
        let samples = groups
            .entry(key)
            .or_insert_with(|| vec![Vec::new(); n_metrics]);
        for (col, &value) in row.values.iter().enumerate() {
            if value.is_finite() {
                samples[col].push(value);
            }
        }
    }

    let mut keys = Vec::with_capacity(groups.len());
    let mut stats = Vec::with_capacity(groups.len());
    for (key, samples) in groups {
        let row: Vec<MetricSummary> = samples
            .iter()
            .map(|values| summarize_cell(values, z))
            .collect();
        keys.push(key);
        stats.push(row);
    }

    Ok(SummaryTable {
        group_by,
        metric_names: table.metric_names().to_vec(),
        keys,
        stats,
    })
}

fn summarize_cell(values: &[f64], z: f64) -> MetricSummary {
    let n = values.len();
    if n == 0 {
        return MetricSummary {
            n,
            mean: f64::NAN,
            sd: f64::NAN,
            ci_lower: f64::NAN,
            ci_upper: f64::NAN,
        };
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let sd = if n < 2 {
        f64::NAN
    } else {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    };
    MetricSummary {
        n,
        mean,
        sd,
        ci_lower: mean - z * sd,
        ci_upper: mean + z * sd,
    }
}
