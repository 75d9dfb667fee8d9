//! Regional species pool (source abundance distribution).

use crate::data::CommunityMatrix;
use crate::error::{PhyloError, Result};
use serde::{Deserialize, Serialize};

/// The regional abundance vector: the species pool a local community is
/// assumed to be drawn from, as species identifiers with abundance weights.
///
/// Null models that resample from pool composition (e.g. the regional null)
/// draw individuals proportional to these weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalPool {
    species_ids: Vec<String>,
    abundances: Vec<u64>,
}

impl RegionalPool {
    /// Create a pool from parallel species/abundance vectors.
    pub fn new(species_ids: Vec<String>, abundances: Vec<u64>) -> Result<Self> {
        if species_ids.len() != abundances.len() {
            return Err(PhyloError::DimensionMismatch {
                expected: species_ids.len(),
                actual: abundances.len(),
            });
        }
        if abundances.iter().all(|&a| a == 0) {
            return Err(PhyloError::EmptyData(
                "regional pool has no individuals".to_string(),
            ));
        }
        Ok(Self {
            species_ids,
            abundances,
        })
    }

    /// Derive a pool from a community matrix as per-species column sums.
    ///
    /// This is the fallback when no explicit regional abundance is supplied;
    /// it assumes the sampled communities are representative of the region.
    pub fn from_cdm(cdm: &CommunityMatrix) -> Result<Self> {
        Self::new(cdm.species_ids().to_vec(), cdm.col_sums())
    }

    /// Species identifiers.
    pub fn species_ids(&self) -> &[String] {
        &self.species_ids
    }

    /// Abundance weight per species.
    pub fn abundances(&self) -> &[u64] {
        &self.abundances
    }

    /// Total number of individuals in the pool.
    pub fn total(&self) -> u64 {
        self.abundances.iter().sum()
    }

    /// Sample one species index proportional to abundance, given a uniform
    /// draw `u` in [0, 1).
    pub fn sample_index(&self, u: f64) -> usize {
        let target = u * self.total() as f64;
        let mut cumulative = 0.0;
        for (idx, &a) in self.abundances.iter().enumerate() {
            cumulative += a as f64;
            if target < cumulative {
                return idx;
            }
        }
        self.abundances.len() - 1
    }
}
