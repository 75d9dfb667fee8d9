//! Null-model hypothesis testing for phylogenetic community structure.
//!
//! Given a community data matrix (quadrats × species abundances) and a
//! phylogenetic tree over the species, this library asks whether observed
//! structure metrics deviate from what a family of null models would produce
//! by chance.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (CommunityMatrix, PhyloTree, RegionalPool, tables)
//! - **arena**: Spatial quadrat placement and community-matrix sampling
//! - **registry**: Named catalogues of metrics and null models
//! - **metric**: Prepared metric context and per-quadrat metric evaluation
//! - **null**: Null-model transforms and the randomization engine
//! - **summarize**: Per-group null-distribution summaries (mean, sd, CI)
//! - **ses**: Standardized effect sizes and significance classification
//! - **test**: Signed-rank location testing over SES tables
//! - **pipeline**: End-to-end analysis composition
//!
//! # Example
//!
//! ```no_run
//! use phylostruct::prelude::*;
//!
//! let cdm = CommunityMatrix::from_rows(
//!     &[vec![3, 1, 0], vec![0, 2, 2]],
//!     vec!["q1".to_string(), "q2".to_string()],
//!     vec!["a".to_string(), "b".to_string(), "c".to_string()],
//! )
//! .unwrap();
//! let tree = PhyloTree::from_newick("((a:1,b:1):1,c:2);").unwrap();
//!
//! let config = AnalysisConfig::default();
//! let result = run_analysis(cdm, Some(&tree), None, &config).unwrap();
//! println!("{}", result.to_json().unwrap());
//! ```

pub mod arena;
pub mod data;
pub mod error;
pub mod metric;
pub mod null;
pub mod pipeline;
pub mod registry;
pub mod ses;
pub mod summarize;
pub mod test;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::arena::{
        place_and_sample, place_quadrats, sample_quadrats, QuadratBounds, SpatialArena,
    };
    pub use crate::data::{
        CommunityMatrix, GroupBy, GroupKey, MetricTable, PhyloTree, RegionalPool, ReplicateRow,
        ReplicateTable, RICHNESS,
    };
    pub use crate::error::{PhyloError, Result};
    pub use crate::metric::{run_metrics, MetricContext};
    pub use crate::null::{run_nulls, NullContext, NullParams, RandomizeConfig};
    pub use crate::pipeline::{run_analysis, AnalysisConfig, AnalysisResult, NullOutcome};
    pub use crate::registry::{MetricEntry, MetricFn, MetricRegistry, NullEntry, NullFn, NullRegistry};
    pub use crate::ses::{
        classify, merge_observed, standardize, MergedTable, SesTable, Significance,
        SignificanceTable,
    };
    pub use crate::summarize::{summarize, MetricSummary, SummaryTable};
    pub use crate::test::{
        robust_test, signed_rank_test, Alternative, MetricLocationTest, WilcoxonTest,
    };
}
