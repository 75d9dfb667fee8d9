//! Typed metric tables and grouping keys.
//!
//! The randomization pipeline moves tables of per-quadrat metric values
//! between stages. These are explicit types with named columns and loud
//! accessors rather than raw matrices, so a misaligned merge is an error
//! instead of a silently shifted column.

use crate::error::{PhyloError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical name of the guaranteed first metric column.
pub const RICHNESS: &str = "richness";

/// How replicate rows are grouped for summarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupBy {
    /// Group by a row's species richness (rows of equal richness pool together).
    Richness,
    /// Group by quadrat identity (each quadrat summarized across replicates).
    Quadrat,
}

/// A concrete grouping-key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupKey {
    Richness(u64),
    Quadrat(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Richness(r) => write!(f, "richness={}", r),
            GroupKey::Quadrat(q) => write!(f, "quadrat={}", q),
        }
    }
}

/// One row of metric values per quadrat, one named column per metric.
///
/// The `richness` column is always present and always first (the registry
/// enforces this at resolution time). Row order follows the source matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricTable {
    quadrat_ids: Vec<String>,
    metric_names: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl MetricTable {
    /// Assemble a table, validating that every row matches the column count
    /// and that a richness column is present.
    pub fn new(
        quadrat_ids: Vec<String>,
        metric_names: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if values.len() != quadrat_ids.len() {
            return Err(PhyloError::DimensionMismatch {
                expected: quadrat_ids.len(),
                actual: values.len(),
            });
        }
        for row in &values {
            if row.len() != metric_names.len() {
                return Err(PhyloError::DimensionMismatch {
                    expected: metric_names.len(),
                    actual: row.len(),
                });
            }
        }
        if !metric_names.iter().any(|m| m == RICHNESS) {
            return Err(PhyloError::InvalidParameter(
                "metric table is missing the richness column".to_string(),
            ));
        }
        Ok(Self {
            quadrat_ids,
            metric_names,
            values,
        })
    }

    /// Number of rows (quadrats).
    pub fn n_rows(&self) -> usize {
        self.values.len()
    }

    /// Number of metric columns.
    pub fn n_metrics(&self) -> usize {
        self.metric_names.len()
    }

    /// Metric column names, in column order.
    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    /// Quadrat identifiers, in row order.
    pub fn quadrat_ids(&self) -> &[String] {
        &self.quadrat_ids
    }

    /// The value at (row, column index).
    pub fn value(&self, row: usize, metric: usize) -> f64 {
        self.values[row][metric]
    }

    /// Full row of values for a quadrat.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row]
    }

    /// Column index for a metric name.
    pub fn metric_index(&self, name: &str) -> Option<usize> {
        self.metric_names.iter().position(|m| m == name)
    }

    /// A full column of values by metric name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.metric_index(name)?;
        Some(self.values.iter().map(|row| row[idx]).collect())
    }

    /// Integer richness of a row, read from the richness column.
    pub fn richness_of(&self, row: usize) -> u64 {
        let idx = self
            .metric_index(RICHNESS)
            .expect("richness column is validated at construction");
        self.values[row][idx] as u64
    }

    /// The grouping-key value for a row under the given mode.
    pub fn group_key(&self, row: usize, group_by: GroupBy) -> GroupKey {
        match group_by {
            GroupBy::Richness => GroupKey::Richness(self.richness_of(row)),
            GroupBy::Quadrat => GroupKey::Quadrat(self.quadrat_ids[row].clone()),
        }
    }
}

/// One quadrat row from one randomization replicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicateRow {
    /// Replicate index within the null model's run.
    pub replicate: usize,
    /// Quadrat identifier.
    pub quadrat_id: String,
    /// Metric values, aligned with the table's metric names.
    pub values: Vec<f64>,
}

/// Long-format record of one null model's randomization run: one row per
/// (replicate, quadrat), one column per metric, richness first.
///
/// A replicate table is a pure recording: it is assembled once by the
/// randomization engine and exposes no mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicateTable {
    null_name: String,
    metric_names: Vec<String>,
    rows: Vec<ReplicateRow>,
}

impl ReplicateTable {
    /// Assemble a replicate table, validating row widths.
    pub fn new(
        null_name: String,
        metric_names: Vec<String>,
        rows: Vec<ReplicateRow>,
    ) -> Result<Self> {
        for row in &rows {
            if row.values.len() != metric_names.len() {
                return Err(PhyloError::DimensionMismatch {
                    expected: metric_names.len(),
                    actual: row.values.len(),
                });
            }
        }
        if !metric_names.iter().any(|m| m == RICHNESS) {
            return Err(PhyloError::InvalidParameter(
                "replicate table is missing the richness column".to_string(),
            ));
        }
        Ok(Self {
            null_name,
            metric_names,
            rows,
        })
    }

    /// Name of the null model that produced this table.
    pub fn null_name(&self) -> &str {
        &self.null_name
    }

    /// Metric column names, in column order.
    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    /// All rows, replicate-major.
    pub fn rows(&self) -> &[ReplicateRow] {
        &self.rows
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct replicates recorded.
    pub fn n_replicates(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.replicate)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// Column index for a metric name.
    pub fn metric_index(&self, name: &str) -> Option<usize> {
        self.metric_names.iter().position(|m| m == name)
    }

    /// The grouping-key value for a row under the given mode.
    pub fn group_key(&self, row: &ReplicateRow, group_by: GroupBy) -> GroupKey {
        match group_by {
            GroupBy::Richness => {
                let idx = self
                    .metric_index(RICHNESS)
                    .expect("richness column is validated at construction");
                GroupKey::Richness(row.values[idx] as u64)
            }
            GroupBy::Quadrat => GroupKey::Quadrat(row.quadrat_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_table() -> MetricTable {
        MetricTable::new(
            vec!["q1".to_string(), "q2".to_string()],
            vec![RICHNESS.to_string(), "mpd".to_string()],
            vec![vec![3.0, 1.5], vec![1.0, f64::NAN]],
        )
        .unwrap()
    }

    #[test]
    fn test_metric_table_accessors() {
        let table = create_test_table();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.n_metrics(), 2);
        assert_eq!(table.value(0, 1), 1.5);
        assert_eq!(table.richness_of(0), 3);
        assert_eq!(table.column(RICHNESS), Some(vec![3.0, 1.0]));
        assert!(table.column("mntd").is_none());
    }

    #[test]
    fn test_group_keys() {
        let table = create_test_table();
        assert_eq!(table.group_key(0, GroupBy::Richness), GroupKey::Richness(3));
        assert_eq!(
            table.group_key(1, GroupBy::Quadrat),
            GroupKey::Quadrat("q2".to_string())
        );
    }

    #[test]
    fn test_missing_richness_column_rejected() {
        let result = MetricTable::new(
            vec!["q1".to_string()],
            vec!["mpd".to_string()],
            vec![vec![1.0]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = MetricTable::new(
            vec!["q1".to_string()],
            vec![RICHNESS.to_string(), "mpd".to_string()],
            vec![vec![1.0]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_replicate_table() {
        let rows = vec![
            ReplicateRow {
                replicate: 0,
                quadrat_id: "q1".to_string(),
                values: vec![2.0, 0.3],
            },
            ReplicateRow {
                replicate: 1,
                quadrat_id: "q1".to_string(),
                values: vec![2.0, 0.4],
            },
        ];
        let table = ReplicateTable::new(
            "richness".to_string(),
            vec![RICHNESS.to_string(), "mpd".to_string()],
            rows,
        )
        .unwrap();
        assert_eq!(table.n_replicates(), 2);
        assert_eq!(
            table.group_key(&table.rows()[0], GroupBy::Richness),
            GroupKey::Richness(2)
        );
    }

    #[test]
    fn test_group_key_display() {
        assert_eq!(GroupKey::Richness(4).to_string(), "richness=4");
        assert_eq!(
            GroupKey::Quadrat("q7".to_string()).to_string(),
            "quadrat=q7"
        );
    }
}
