//! Column-wise location testing over SES tables.

use crate::data::RICHNESS;
use crate::ses::SesTable;
use crate::test::signed_rank::{signed_rank_test, Alternative};
use serde::{Deserialize, Serialize};

/// One metric column's location test against zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricLocationTest {
    /// Metric column name.
    pub metric: String,
    /// Mean of the column's finite values.
    pub estimate: f64,
    /// Signed-rank statistic (W+).
    pub statistic: f64,
    pub p_value: f64,
    /// Number of values the test ran on.
    pub n: usize,
}

/// Run the signed-rank test against zero on every metric column of an SES
/// table.
///
/// An SES of zero means "indistinguishable from the null", so a column-wide
/// shift is evidence of consistent structure across quadrats. Any `richness`
/// column is skipped: it is a grouping key, not a response. Flat or empty
/// columns come back with p = 1.0 via the test's degenerate-input policy.
pub fn robust_test(ses: &SesTable, alternative: Alternative) -> Vec<MetricLocationTest> {
    ses.metric_names()
        .iter()
        .filter(|name| name.as_str() != RICHNESS)
        .map(|name| {
            let column = ses
                .column(name)
                .expect("iterating the table's own metric names");
            let finite: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
            let estimate = if finite.is_empty() {
                f64::NAN
            } else {
                finite.iter().sum::<f64>() / finite.len() as f64
            };
            let test = signed_rank_test(&column, 0.0, alternative);
            MetricLocationTest {
                metric: name.clone(),
                estimate,
                statistic: test.statistic,
                p_value: test.p_value,
                n: test.n,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GroupBy, MetricTable, ReplicateRow, ReplicateTable, RICHNESS};
    use crate::ses::{merge_observed, standardize};
    use crate::summarize::summarize;

    /// Build an SES table through the real pipeline: null replicates centred
    /// on 10, observed values shifted as requested per quadrat.
    fn create_ses(observed_shifts: &[f64]) -> SesTable {
        let rows: Vec<ReplicateRow> = (0..20)
            .map(|replicate| ReplicateRow {
                replicate,
                quadrat_id: "q1".to_string(),
                values: vec![2.0, 10.0 + (replicate % 5) as f64 - 2.0],
            })
            .collect();
        let table = ReplicateTable::new(
            "test".to_string(),
            vec![RICHNESS.to_string(), "mpd".to_string()],
            rows,
        )
        .unwrap();
        let summary = summarize(&table, GroupBy::Richness, 0.05).unwrap();

        let observed = MetricTable::new(
            (1..=observed_shifts.len()).map(|i| format!("q{}", i)).collect(),
            vec![RICHNESS.to_string(), "mpd".to_string()],
            observed_shifts.iter().map(|&s| vec![2.0, 10.0 + s]).collect(),
        )
        .unwrap();
        let merged = merge_observed(&observed, &summary).unwrap();
        standardize(&merged)
    }

    #[test]
    fn test_shifted_column_detected() {
        let ses = create_ses(&[3.0, 4.0, 3.5, 5.0, 4.5, 3.8, 4.2, 3.3]);
        let results = robust_test(&ses, Alternative::TwoSided);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metric, "mpd");
        assert!(results[0].estimate > 0.0);
        assert!(results[0].p_value < 0.05);
        assert_eq!(results[0].n, 8);
    }

    #[test]
    fn test_directional_alternatives() {
        let ses = create_ses(&[3.0, 4.0, 3.5, 5.0, 4.5]);
        let greater = robust_test(&ses, Alternative::Greater);
        let less = robust_test(&ses, Alternative::Less);
        assert!(greater[0].p_value < less[0].p_value);
    }

    #[test]
    fn test_richness_column_excluded() {
        let ses = create_ses(&[1.0, -1.0]);
        let results = robust_test(&ses, Alternative::TwoSided);
        assert!(results.iter().all(|r| r.metric != RICHNESS));
    }
}
