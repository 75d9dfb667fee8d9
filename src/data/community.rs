//! Community data matrix with sparse storage for abundance data.

use crate::error::{PhyloError, Result};
use rayon::prelude::*;
use sprs::{CsMat, TriMat};

/// A sparse community data matrix (CDM) of species abundances.
///
/// Rows represent sampling units (quadrats or sites), columns represent
/// species. Values are non-negative abundances with 0 meaning absent.
/// Uses CSR (Compressed Sparse Row) format for efficient row-wise access,
/// since metrics and null models operate unit by unit.
///
/// Row identity (the quadrat id) and per-row richness are carried as
/// first-class attributes of the matrix rather than recomputed ad hoc.
#[derive(Debug, Clone)]
pub struct CommunityMatrix {
    /// Sparse matrix in CSR format (quadrats × species)
    data: CsMat<u64>,
    /// Quadrat identifiers (row names)
    quadrat_ids: Vec<String>,
    /// Species identifiers (column names)
    species_ids: Vec<String>,
}

impl CommunityMatrix {
    /// Create a new CommunityMatrix from a sparse matrix and identifiers.
    pub fn new(
        data: CsMat<u64>,
        quadrat_ids: Vec<String>,
        species_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != quadrat_ids.len() {
            return Err(PhyloError::DimensionMismatch {
                expected: nrows,
                actual: quadrat_ids.len(),
            });
        }
        if ncols != species_ids.len() {
            return Err(PhyloError::DimensionMismatch {
                expected: ncols,
                actual: species_ids.len(),
            });
        }
        Ok(Self {
            data,
            quadrat_ids,
            species_ids,
        })
    }

    /// Build a matrix from dense rows, one `Vec<u64>` per quadrat.
    ///
    /// Zeros are not stored. Every row must have one entry per species.
    pub fn from_rows(
        rows: &[Vec<u64>],
        quadrat_ids: Vec<String>,
        species_ids: Vec<String>,
    ) -> Result<Self> {
        let n_species = species_ids.len();
        let mut tri_mat = TriMat::new((rows.len(), n_species));
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != n_species {
                return Err(PhyloError::DimensionMismatch {
                    expected: n_species,
                    actual: row.len(),
                });
            }
            for (col_idx, &val) in row.iter().enumerate() {
                if val > 0 {
                    tri_mat.add_triplet(row_idx, col_idx, val);
                }
            }
        }
        Self::new(tri_mat.to_csr(), quadrat_ids, species_ids)
    }

    /// Get the value at (row, col), returning 0 for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.data.get(row, col).copied().unwrap_or(0)
    }

    /// Number of quadrats (rows).
    #[inline]
    pub fn n_quadrats(&self) -> usize {
        self.data.rows()
    }

    /// Number of species (columns).
    #[inline]
    pub fn n_species(&self) -> usize {
        self.data.cols()
    }

    /// Quadrat identifiers.
    #[inline]
    pub fn quadrat_ids(&self) -> &[String] {
        &self.quadrat_ids
    }

    /// Species identifiers.
    #[inline]
    pub fn species_ids(&self) -> &[String] {
        &self.species_ids
    }

    /// Get the underlying sparse matrix.
    #[inline]
    pub fn data(&self) -> &CsMat<u64> {
        &self.data
    }

    /// Get a dense abundance vector for a specific quadrat.
    pub fn row_dense(&self, row: usize) -> Vec<u64> {
        let mut dense = vec![0u64; self.n_species()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Species richness per quadrat: the count of species with abundance > 0.
    ///
    /// Counts strictly positive values, so explicitly stored zeros do not
    /// inflate richness.
    pub fn richness(&self) -> Vec<u64> {
        (0..self.n_quadrats())
            .into_par_iter()
            .map(|row| {
                self.data
                    .outer_view(row)
                    .map(|v| v.iter().filter(|(_, &val)| val > 0).count() as u64)
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Total abundance per quadrat (row sums).
    pub fn row_sums(&self) -> Vec<u64> {
        (0..self.n_quadrats())
            .into_par_iter()
            .map(|row| {
                self.data
                    .outer_view(row)
                    .map(|v| v.iter().map(|(_, &val)| val).sum())
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Total abundance per species (column sums).
    pub fn col_sums(&self) -> Vec<u64> {
        let mut sums = vec![0u64; self.n_species()];
        for row_vec in self.data.outer_iterator() {
            for (col, &val) in row_vec.iter() {
                sums[col] += val;
            }
        }
        sums
    }

    /// Number of quadrats occupied per species (occurrence frequency).
    pub fn occurrence_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_species()];
        for row_vec in self.data.outer_iterator() {
            for (col, &val) in row_vec.iter() {
                if val > 0 {
                    counts[col] += 1;
                }
            }
        }
        counts
    }

    /// Column indices of species present (abundance > 0) in a quadrat.
    pub fn present_species(&self, row: usize) -> Vec<usize> {
        self.data
            .outer_view(row)
            .map(|v| {
                v.iter()
                    .filter(|(_, &val)| val > 0)
                    .map(|(col, _)| col)
                    .collect()
            })
            .unwrap_or_default()
    }
}
