//! End-to-end analysis: observed metrics, randomization, and significance.

use crate::data::{CommunityMatrix, GroupBy, MetricTable, PhyloTree, RegionalPool};
use crate::error::{PhyloError, Result};
use crate::metric::run_metrics;
use crate::null::{run_nulls, NullContext, RandomizeConfig};
use crate::ses::{classify, merge_observed, standardize, SesTable, SignificanceTable};
use crate::summarize::{summarize, SummaryTable};
use crate::test::{robust_test, Alternative, MetricLocationTest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for a full analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Metric subset to run; `None` runs the full catalogue.
    pub metrics: Option<Vec<String>>,
    /// Null-model subset to run; `None` runs the full catalogue.
    pub nulls: Option<Vec<String>>,
    /// Grouping mode for summarization and merging.
    pub group_by: GroupBy,
    /// Two-sided confidence level for classification (CI spans 1 - alpha).
    pub alpha: f64,
    /// Randomization settings.
    pub randomize: RandomizeConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            metrics: None,
            nulls: None,
            group_by: GroupBy::Richness,
            alpha: 0.05,
            randomize: RandomizeConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(PhyloError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(PhyloError::from)
    }
}

/// Everything derived from one null model's randomization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullOutcome {
    /// Per-group null distribution summary.
    pub summary: SummaryTable,
    /// Standardized effect sizes per quadrat.
    pub ses: SesTable,
    /// Tri-state significance calls per quadrat.
    pub significance: SignificanceTable,
    /// Column-wise location tests over the SES table (two-sided).
    pub location_tests: Vec<MetricLocationTest>,
}

/// Result of a full analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Observed metric values.
    pub observed: MetricTable,
    /// Per-null-model outcomes, keyed by null name.
    pub per_null: BTreeMap<String, NullOutcome>,
}

impl AnalysisResult {
    /// Serialize the full result to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(PhyloError::from)
    }
}

/// Run the whole pipeline: prepare the context, compute observed metrics,
/// randomize under each selected null, summarize, standardize, classify, and
/// run the location-test battery.
///
/// The replicate tables themselves are not retained in the result; callers
/// wanting the raw randomization record use [`run_nulls`] directly.
pub fn run_analysis(
    cdm: CommunityMatrix,
    tree: Option<&PhyloTree>,
    pool: Option<RegionalPool>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult> {
    let ctx = NullContext::prepare(cdm, tree, pool)?;
    let observed = run_metrics(ctx.metric_context(), config.metrics.as_deref())?;
    let replicate_tables = run_nulls(
        &ctx,
        config.nulls.as_deref(),
        config.metrics.as_deref(),
        &config.randomize,
    )?;

    let mut per_null = BTreeMap::new();
    for (name, table) in replicate_tables {
        let summary = summarize(&table, config.group_by, config.alpha)?;
        let merged = merge_observed(&observed, &summary)?;
        let ses = standardize(&merged);
        let significance = classify(&merged);
        let location_tests = robust_test(&ses, Alternative::TwoSided);
        per_null.insert(
            name,
            NullOutcome {
                summary,
                ses,
                significance,
                location_tests,
            },
        );
    }

    Ok(AnalysisResult { observed, per_null })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RICHNESS;

    fn create_test_inputs() -> (CommunityMatrix, PhyloTree) {
        let rows = vec![
            vec![3, 1, 0, 0, 2],
            vec![0, 2, 2, 1, 0],
            vec![1, 0, 0, 4, 1],
            vec![2, 2, 1, 0, 0],
        ];
        let cdm = CommunityMatrix::from_rows(
            &rows,
            (1..=4).map(|i| format!("q{}", i)).collect(),
            vec!["a", "b", "c", "d", "e"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
        .unwrap();
        let tree =
            PhyloTree::from_newick("(((a:1,b:1):1,(c:1,d:1):1):1,e:3);").unwrap();
        (cdm, tree)
    }

    fn quick_config() -> AnalysisConfig {
        AnalysisConfig {
            // Both selected nulls preserve per-quadrat richness, so every
            // observed richness key is guaranteed a summary row.
            nulls: Some(vec![
                "richness".to_string(),
                "independent_swap".to_string(),
            ]),
            randomize: RandomizeConfig {
                n_replicates: 20,
                seed: 42,
                parallel: false,
                swap_iterations: 200,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_run_analysis_shapes() {
        let (cdm, tree) = create_test_inputs();
        let result = run_analysis(cdm, Some(&tree), None, &quick_config()).unwrap();
        assert_eq!(result.observed.n_rows(), 4);
        assert_eq!(result.observed.metric_names()[0], RICHNESS);
        assert_eq!(result.per_null.len(), 2);
        for outcome in result.per_null.values() {
            assert_eq!(outcome.ses.n_rows(), 4);
            assert_eq!(outcome.significance.n_rows(), 4);
            // richness is the grouping key, so it is not a tested response
            assert!(outcome.location_tests.iter().all(|t| t.metric != RICHNESS));
        }
    }

    #[test]
    fn test_result_serializes_to_json() {
        let (cdm, tree) = create_test_inputs();
        let result = run_analysis(cdm, Some(&tree), None, &quick_config()).unwrap();
        let json = result.to_json().unwrap();
        assert!(json.contains("per_null"));
        assert!(json.contains("richness"));
    }

    #[test]
    fn test_config_yaml_round_trip() {
        let config = quick_config();
        let yaml = config.to_yaml().unwrap();
        let parsed = AnalysisConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.nulls, config.nulls);
        assert_eq!(parsed.alpha, config.alpha);
        assert_eq!(parsed.randomize.n_replicates, config.randomize.n_replicates);
    }

    #[test]
    fn test_unknown_null_fails() {
        let (cdm, tree) = create_test_inputs();
        let config = AnalysisConfig {
            nulls: Some(vec!["bogus".to_string()]),
            ..quick_config()
        };
        assert!(run_analysis(cdm, Some(&tree), None, &config).is_err());
    }
}
