//! Prepared context for null-model randomization.

use crate::data::{CommunityMatrix, PhyloTree, RegionalPool};
use crate::error::{PhyloError, Result};
use crate::metric::MetricContext;

/// Everything null models and their metric evaluation need, validated once.
///
/// `prepare` is the only constructor: the embedded [`MetricContext`] carries
/// the pruned tree and cached distances, and the regional pool is derived
/// from the matrix (with a warning) when not supplied. A context that exists
/// is a context the randomization engine can trust without re-checking.
#[derive(Debug, Clone)]
pub struct NullContext {
    metrics: MetricContext,
    pool: RegionalPool,
}

/// Per-invocation parameters handed to a null transform.
#[derive(Debug, Clone, Copy)]
pub struct NullParams {
    /// Seed for the transform's private generator.
    pub seed: u64,
    /// Attempted swaps for swap-based nulls.
    pub swap_iterations: usize,
}

impl NullContext {
    /// Validate inputs, prune the tree, and derive the regional pool from
    /// column sums when none is given.
    ///
    /// Pool species must all be columns of the matrix, since randomized
    /// matrices keep the observed species set.
    pub fn prepare(
        cdm: CommunityMatrix,
        tree: Option<&PhyloTree>,
        pool: Option<RegionalPool>,
    ) -> Result<Self> {
        let pool = match pool {
            Some(pool) => {
                for species in pool.species_ids() {
                    if !cdm.species_ids().contains(species) {
                        return Err(PhyloError::SpeciesMismatch(format!(
                            "pool species '{}' is not a column of the community matrix",
                            species
                        )));
                    }
                }
                pool
            }
            None => {
                log::warn!(
                    "no regional abundance supplied; deriving the pool from \
                     community column sums"
                );
                RegionalPool::from_cdm(&cdm)?
            }
        };
        let metrics = MetricContext::prepare(cdm, tree, Some(pool.clone()))?;
        Ok(Self { metrics, pool })
    }

    /// The observed community matrix.
    pub fn cdm(&self) -> &CommunityMatrix {
        self.metrics.cdm()
    }

    /// The regional pool (supplied or derived).
    pub fn pool(&self) -> &RegionalPool {
        &self.pool
    }

    /// The embedded metric context (pruned tree, cached distances).
    pub fn metric_context(&self) -> &MetricContext {
        &self.metrics
    }
}
