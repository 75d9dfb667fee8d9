//! Prepared context for metric evaluation.

use crate::data::{CommunityMatrix, PhyloTree, RegionalPool};
use crate::error::{PhyloError, Result};
use nalgebra::DMatrix;

/// Everything metrics need, validated and precomputed once.
///
/// `prepare` is the only way to build one: the tree is checked against the
/// matrix species, pruned to them, and its cophenetic distances cached, so a
/// context that exists is a context whose pieces agree with each other.
#[derive(Debug, Clone)]
pub struct MetricContext {
    cdm: CommunityMatrix,
    tree: Option<PhyloTree>,
    cophenetic: Option<DMatrix<f64>>,
    pool: Option<RegionalPool>,
}

impl MetricContext {
    /// Validate inputs and precompute tree-derived quantities.
    ///
    /// The tree's tips must cover every species in the matrix; it is pruned
    /// to exactly that set, and pairwise cophenetic distances are computed in
    /// matrix column order so metrics can index them by species column.
    pub fn prepare(
        cdm: CommunityMatrix,
        tree: Option<&PhyloTree>,
        pool: Option<RegionalPool>,
    ) -> Result<Self> {
        if cdm.n_quadrats() == 0 || cdm.n_species() == 0 {
            return Err(PhyloError::EmptyData(
                "community matrix has no quadrats or no species".to_string(),
            ));
        }
        let (tree, cophenetic) = match tree {
            Some(tree) => {
                tree.check_coverage(cdm.species_ids())?;
                let pruned = tree.prune_to(cdm.species_ids())?;
                let dist = pruned.cophenetic(cdm.species_ids())?;
                (Some(pruned), Some(dist))
            }
            None => (None, None),
        };
        Ok(Self {
            cdm,
            tree,
            cophenetic,
            pool,
        })
    }

    /// Rebuild the context around a different community matrix over the same
    /// species set, reusing the pruned tree and cached distances.
    ///
    /// This is how randomized matrices are evaluated without re-pruning per
    /// replicate. Fails if the species columns differ from the original.
    pub fn with_cdm(&self, cdm: CommunityMatrix) -> Result<Self> {
        if cdm.species_ids() != self.cdm.species_ids() {
            return Err(PhyloError::SpeciesMismatch(
                "randomized matrix has different species columns".to_string(),
            ));
        }
        Ok(Self {
            cdm,
            tree: self.tree.clone(),
            cophenetic: self.cophenetic.clone(),
            pool: self.pool.clone(),
        })
    }

    /// The community matrix.
    pub fn cdm(&self) -> &CommunityMatrix {
        &self.cdm
    }

    /// The pruned tree, if one was supplied.
    pub fn tree(&self) -> Option<&PhyloTree> {
        self.tree.as_ref()
    }

    /// Cophenetic distances in species column order, if a tree was supplied.
    pub fn cophenetic(&self) -> Option<&DMatrix<f64>> {
        self.cophenetic.as_ref()
    }

    /// The regional pool, if one was supplied.
    pub fn pool(&self) -> Option<&RegionalPool> {
        self.pool.as_ref()
    }

    /// Whether tree-dependent metrics can run.
    pub fn has_tree(&self) -> bool {
        self.tree.is_some()
    }
}
