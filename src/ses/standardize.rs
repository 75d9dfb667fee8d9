//! Standardized effect sizes against null distributions.

use crate::data::{GroupBy, GroupKey};
use crate::ses::MergedTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Standardized effect sizes, one row per quadrat, one column per metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SesTable {
    group_by: GroupBy,
    metric_names: Vec<String>,
    quadrat_ids: Vec<String>,
    keys: Vec<GroupKey>,
    values: Vec<Vec<f64>>,
}

impl SesTable {
    /// Grouping mode the standardization was made under.
    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    /// Metric column names.
    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    /// Quadrat identifiers, in row order.
    pub fn quadrat_ids(&self) -> &[String] {
        &self.quadrat_ids
    }

    /// Grouping keys, in row order.
    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.values.len()
    }

    /// SES value at (row, metric column).
    pub fn value(&self, row: usize, metric: usize) -> f64 {
        self.values[row][metric]
    }

    /// A full column of SES values by metric name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.metric_names.iter().position(|m| m == name)?;
        Some(self.values.iter().map(|row| row[idx]).collect())
    }
}

/// Compute `(observed - group mean) / group sd` per metric per row.
///
/// Zero-variance substitution: groups whose sd is exactly 0 (too few
/// replicates, or a degenerate richness level) would divide to infinity, so
/// their sd is replaced by the mean of the finite non-zero sds of that metric
/// across the table's distinct groups. The SES at such a group is an
/// approximation. NaN sds (single-replicate groups) are not substituted and
/// propagate NaN; when a metric has no finite non-zero sd anywhere, there is
/// nothing defensible to substitute and the cell stays NaN.
pub fn standardize(merged: &MergedTable) -> SesTable {
    let n_metrics = merged.metric_names().len();

    // Per metric, the substitute for zero sds: mean over distinct groups.
    let substitutes: Vec<Option<f64>> = (0..n_metrics)
        .map(|metric| {
            let mut per_group: BTreeMap<&GroupKey, f64> = BTreeMap::new();
            for row in 0..merged.n_rows() {
                per_group
                    .entry(&merged.keys()[row])
                    .or_insert(merged.summary(row, metric).sd);
            }
            let usable: Vec<f64> = per_group
                .values()
                .copied()
                .filter(|sd| sd.is_finite() && *sd > 0.0)
                .collect();
            if usable.is_empty() {
                None
            } else {
                Some(usable.iter().sum::<f64>() / usable.len() as f64)
            }
        })
        .collect();

    let values: Vec<Vec<f64>> = (0..merged.n_rows())
        .map(|row| {
            (0..n_metrics)
                .map(|metric| {
                    let cell = merged.summary(row, metric);
                    let sd = if cell.sd == 0.0 {
                        substitutes[metric].unwrap_or(f64::NAN)
                    } else {
                        cell.sd
                    };
                    (merged.observed(row, metric) - cell.mean) / sd
                })
                .collect()
        })
        .collect();

    SesTable {
        group_by: merged.group_by(),
        metric_names: merged.metric_names().to_vec(),
        quadrat_ids: merged.quadrat_ids().to_vec(),
        keys: merged.keys().to_vec(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GroupBy, MetricTable, ReplicateRow, ReplicateTable, RICHNESS};
    use crate::ses::merge_observed;
    use crate::summarize::summarize;
    use approx::assert_relative_eq;

    /// Build a merged table with controlled group sds: one group per richness
    /// level, replicate mpd values chosen to hit the requested sd.
    fn create_merged(group_sds: &[(u64, f64)], observed_mpd: &[f64]) -> MergedTable {
        let mut rows = Vec::new();
        let mut replicate = 0;
        for &(richness, sd) in group_sds {
            // Two replicates at mean 10 with the requested sample sd.
            let half = sd / 2.0_f64.sqrt();
            for value in [10.0 - half, 10.0 + half] {
                rows.push(ReplicateRow {
                    replicate,
                    quadrat_id: "q1".to_string(),
                    values: vec![richness as f64, value],
                });
                replicate += 1;
            }
        }
        let table = ReplicateTable::new(
            "test".to_string(),
            vec![RICHNESS.to_string(), "mpd".to_string()],
            rows,
        )
        .unwrap();
        let summary = summarize(&table, GroupBy::Richness, 0.05).unwrap();

        let observed = MetricTable::new(
            (1..=group_sds.len()).map(|i| format!("q{}", i)).collect(),
            vec![RICHNESS.to_string(), "mpd".to_string()],
            group_sds
                .iter()
                .zip(observed_mpd)
                .map(|(&(richness, _), &mpd)| vec![richness as f64, mpd])
                .collect(),
        )
        .unwrap();
        merge_observed(&observed, &summary).unwrap()
    }

    #[test]
    fn test_basic_ses() {
        let merged = create_merged(&[(2, 2.0)], &[14.0]);
        let ses = standardize(&merged);
        // (14 - 10) / 2
        assert_relative_eq!(ses.value(0, 0), 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_zero_sd_substituted_with_mean_of_nonzero_sds() {
        // Group sds 0, 2, 4: the zero group divides by mean(2, 4) = 3.
        let merged = create_merged(&[(2, 0.0), (3, 2.0), (4, 4.0)], &[13.0, 12.0, 10.0]);
        let ses = standardize(&merged);
        assert_relative_eq!(ses.value(0, 0), 1.0, epsilon = 1e-10); // (13-10)/3
        assert_relative_eq!(ses.value(1, 0), 1.0, epsilon = 1e-10); // (12-10)/2
        assert_relative_eq!(ses.value(2, 0), 0.0, epsilon = 1e-10);
        assert!(ses.value(0, 0).is_finite());
    }

    #[test]
    fn test_all_zero_sds_stay_nan() {
        let merged = create_merged(&[(2, 0.0), (3, 0.0)], &[11.0, 12.0]);
        let ses = standardize(&merged);
        assert!(ses.value(0, 0).is_nan());
        assert!(ses.value(1, 0).is_nan());
    }

    #[test]
    fn test_column_accessor() {
        let merged = create_merged(&[(2, 2.0), (3, 2.0)], &[12.0, 8.0]);
        let ses = standardize(&merged);
        let column = ses.column("mpd").unwrap();
        assert_relative_eq!(column[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(column[1], -1.0, epsilon = 1e-10);
        assert!(ses.column("pd").is_none());
    }
}
