//! Building a community matrix from continuous spatial coordinates.

use crate::arena::placer::{place_quadrats, QuadratBounds};
use crate::data::CommunityMatrix;
use crate::error::{PhyloError, Result};
use sprs::TriMat;
use std::collections::BTreeMap;

/// Individuals positioned in a square arena, as parallel coordinate and
/// species vectors. This is the boundary to the upstream spatial simulation:
/// whatever produced the arena, this is the shape it hands over.
#[derive(Debug, Clone)]
pub struct SpatialArena {
    x: Vec<f64>,
    y: Vec<f64>,
    species: Vec<String>,
    arena_length: f64,
}

impl SpatialArena {
    /// Create an arena, validating coordinate bounds and vector lengths.
    pub fn new(x: Vec<f64>, y: Vec<f64>, species: Vec<String>, arena_length: f64) -> Result<Self> {
        if x.len() != y.len() {
            return Err(PhyloError::DimensionMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }
        if x.len() != species.len() {
            return Err(PhyloError::DimensionMismatch {
                expected: x.len(),
                actual: species.len(),
            });
        }
        if x.is_empty() {
            return Err(PhyloError::EmptyData(
                "arena contains no individuals".to_string(),
            ));
        }
        if !(arena_length > 0.0) {
            return Err(PhyloError::InvalidParameter(
                "arena length must be positive".to_string(),
            ));
        }
        for (&xi, &yi) in x.iter().zip(&y) {
            if !(0.0..=arena_length).contains(&xi) || !(0.0..=arena_length).contains(&yi) {
                return Err(PhyloError::InvalidParameter(format!(
                    "individual at ({}, {}) lies outside the arena",
                    xi, yi
                )));
            }
        }
        Ok(Self {
            x,
            y,
            species,
            arena_length,
        })
    }

    /// Number of individuals.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the arena is empty (never true for a constructed arena).
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Arena side length.
    pub fn arena_length(&self) -> f64 {
        self.arena_length
    }

    /// Sorted unique species names across all individuals.
    pub fn species_universe(&self) -> Vec<String> {
        let unique: BTreeMap<&str, ()> = self.species.iter().map(|s| (s.as_str(), ())).collect();
        unique.keys().map(|s| s.to_string()).collect()
    }
}

/// Tally arena individuals into the given quadrats, producing a community
/// matrix with one row per quadrat (ids `q1..qK`, placement order) and one
/// column per species in the arena.
///
/// Individuals outside every quadrat are simply not sampled. Quadrats are
/// non-overlapping by construction, so no individual is counted twice.
pub fn sample_quadrats(arena: &SpatialArena, bounds: &[QuadratBounds]) -> Result<CommunityMatrix> {
    if bounds.is_empty() {
        return Err(PhyloError::EmptyData("no quadrats to sample".to_string()));
    }
    let species_ids = arena.species_universe();
    let col_of: BTreeMap<&str, usize> = species_ids
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    let mut counts = vec![vec![0u64; species_ids.len()]; bounds.len()];
    for i in 0..arena.len() {
        let (x, y) = (arena.x[i], arena.y[i]);
        if let Some(row) = bounds.iter().position(|b| b.contains(x, y)) {
            counts[row][col_of[arena.species[i].as_str()]] += 1;
        }
    }

    let mut tri_mat = TriMat::new((bounds.len(), species_ids.len()));
    for (row, row_counts) in counts.iter().enumerate() {
        for (col, &val) in row_counts.iter().enumerate() {
            if val > 0 {
                tri_mat.add_triplet(row, col, val);
            }
        }
    }

    let quadrat_ids = (1..=bounds.len()).map(|i| format!("q{}", i)).collect();
    CommunityMatrix::new(tri_mat.to_csr(), quadrat_ids, species_ids)
}

/// Place quadrats and sample the arena in one step, returning both the
/// bounds (placement order = quadrat identity) and the resulting matrix.
pub fn place_and_sample(
    arena: &SpatialArena,
    count: usize,
    quadrat_length: f64,
    seed: u64,
) -> Result<(Vec<QuadratBounds>, CommunityMatrix)> {
    let bounds = place_quadrats(count, arena.arena_length(), quadrat_length, seed)?;
    let cdm = sample_quadrats(arena, &bounds)?;
    Ok((bounds, cdm))
}
