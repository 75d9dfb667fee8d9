//! Tri-state significance calls against confidence bounds.

use crate::data::GroupKey;
use crate::ses::MergedTable;
use serde::{Deserialize, Serialize};

/// Outcome of comparing an observed metric against its null CI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Significance {
    /// Observed value inside the bounds (code 0).
    NotSignificant,
    /// Observed below the lower bound (code 1): phylogenetic clustering.
    Clustered,
    /// Observed above the upper bound (code 2): overdispersion.
    Overdispersed,
}

impl Significance {
    /// The conventional integer code.
    pub fn code(&self) -> u8 {
        match self {
            Significance::NotSignificant => 0,
            Significance::Clustered => 1,
            Significance::Overdispersed => 2,
        }
    }
}

/// Significance calls, one row per quadrat, one column per metric.
///
/// Cells are `None` when the observed value or either bound is undefined:
/// coding those 0 would silently report "not significant" for a comparison
/// that never happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignificanceTable {
    metric_names: Vec<String>,
    quadrat_ids: Vec<String>,
    keys: Vec<GroupKey>,
    cells: Vec<Vec<Option<Significance>>>,
}

impl SignificanceTable {
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
        self.cells.len()
    }

    /// Call at (row, metric column).
    pub fn cell(&self, row: usize, metric: usize) -> Option<Significance> {
        self.cells[row][metric]
    }

    /// A full column of calls by metric name.
    pub fn column(&self, name: &str) -> Option<Vec<Option<Significance>>> {
        let idx = self.metric_names.iter().position(|m| m == name)?;
        Some(self.cells.iter().map(|row| row[idx]).collect())
    }
}

/// Classify each observed value against its group's confidence bounds.
///
/// `observed > upper` is overdispersed, `observed < lower` is clustered,
/// anything else is not significant. The overdispersed comparison is
/// evaluated first, so with inverted bounds (lower > upper, possible for
/// degenerate groups) an observed value satisfying both reads as
/// overdispersed. This order is kept for compatibility with long-standing
/// practice; whether it is the right call for inverted bounds is doubtful,
/// and callers seeing inverted bounds should treat the cell with suspicion.
pub fn classify(merged: &MergedTable) -> SignificanceTable {
    let n_metrics = merged.metric_names().len();
    let cells: Vec<Vec<Option<Significance>>> = (0..merged.n_rows())
        .map(|row| {
            (0..n_metrics)
                .map(|metric| {
                    let observed = merged.observed(row, metric);
                    let summary = merged.summary(row, metric);
                    if observed.is_nan() || summary.ci_lower.is_nan() || summary.ci_upper.is_nan()
                    {
                        return None;
                    }
                    Some(if observed > summary.ci_upper {
                        Significance::Overdispersed
                    } else if observed < summary.ci_lower {
                        Significance::Clustered
                    } else {
                        Significance::NotSignificant
                    })
                })
                .collect()
        })
        .collect();

    SignificanceTable {
        metric_names: merged.metric_names().to_vec(),
        quadrat_ids: merged.quadrat_ids().to_vec(),
        keys: merged.keys().to_vec(),
        cells,
    }
}
