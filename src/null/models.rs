//! Built-in null-model transforms.
//!
//! Each transform takes the prepared context plus per-invocation parameters
//! and produces one randomized community matrix over the same quadrats and
//! species. What each null holds fixed is the null hypothesis it encodes:
//!
//! | Null               | Preserved                                          |
//! |--------------------|----------------------------------------------------|
//! | `richness`         | per-quadrat richness and abundance multiset        |
//! | `frequency`        | per-species occurrence count and abundances        |
//! | `regional`         | per-quadrat total abundance (draws from the pool)  |
//! | `independent_swap` | row sums, row richness, column occurrence counts   |

use crate::data::CommunityMatrix;
use crate::error::Result;
use crate::null::{NullContext, NullParams};

/// Minimal xorshift64 generator for reproducible randomization.
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn gen_range(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Fisher-Yates shuffle.
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.gen_range(i + 1);
            slice.swap(i, j);
        }
    }
}

fn rebuild(
    ctx: &NullContext,
    rows: Vec<Vec<u64>>,
) -> Result<CommunityMatrix> {
    CommunityMatrix::from_rows(
        &rows,
        ctx.cdm().quadrat_ids().to_vec(),
        ctx.cdm().species_ids().to_vec(),
    )
}

/// Richness null: each quadrat keeps its richness and its multiset of
/// abundances, but which species carry them is redrawn uniformly.
pub fn null_richness(ctx: &NullContext, params: &NullParams) -> Result<CommunityMatrix> {
    let cdm = ctx.cdm();
    let mut rng = SimpleRng::new(params.seed);
    let n_species = cdm.n_species();

    let mut rows = Vec::with_capacity(cdm.n_quadrats());
    for row in 0..cdm.n_quadrats() {
        let present = cdm.present_species(row);
        let mut abundances: Vec<u64> = present.iter().map(|&col| cdm.get(row, col)).collect();
        rng.shuffle(&mut abundances);

        let mut columns: Vec<usize> = (0..n_species).collect();
        rng.shuffle(&mut columns);

        let mut new_row = vec![0u64; n_species];
        for (&col, &abundance) in columns.iter().zip(&abundances) {
            new_row[col] = abundance;
        }
        rows.push(new_row);
    }
    rebuild(ctx, rows)
}

/// Frequency null: each species column is permuted across quadrats, so
/// per-species occurrence frequency and abundance values are untouched while
/// co-occurrence structure is destroyed.
pub fn null_frequency(ctx: &NullContext, params: &NullParams) -> Result<CommunityMatrix> {
    let cdm = ctx.cdm();
    let mut rng = SimpleRng::new(params.seed);
    let n_quadrats = cdm.n_quadrats();

    let mut rows = vec![vec![0u64; cdm.n_species()]; n_quadrats];
    for col in 0..cdm.n_species() {
        let mut column: Vec<u64> = (0..n_quadrats).map(|row| cdm.get(row, col)).collect();
        rng.shuffle(&mut column);
        for (row, &val) in column.iter().enumerate() {
            rows[row][col] = val;
        }
    }
    rebuild(ctx, rows)
}

/// Regional null: each quadrat's individuals are redrawn one by one from the
/// regional pool, weighted by pool abundance. Per-quadrat total abundance is
/// preserved; composition reflects the pool alone.
pub fn null_regional(ctx: &NullContext, params: &NullParams) -> Result<CommunityMatrix> {
    let cdm = ctx.cdm();
    let pool = ctx.pool();
    let mut rng = SimpleRng::new(params.seed);

    let col_of: Vec<usize> = pool
        .species_ids()
        .iter()
        .map(|species| {
            cdm.species_ids()
                .iter()
                .position(|s| s == species)
                .expect("pool species are validated against matrix columns at prepare")
        })
        .collect();

    let mut rows = Vec::with_capacity(cdm.n_quadrats());
    for &total in &cdm.row_sums() {
        let mut new_row = vec![0u64; cdm.n_species()];
        for _ in 0..total {
            let drawn = pool.sample_index(rng.next_f64());
            new_row[col_of[drawn]] += 1;
        }
        rows.push(new_row);
    }
    rebuild(ctx, rows)
}

/// Independent-swap null: repeated checkerboard swaps on random 2x2
/// submatrices. A swap moves the two diagonal abundances onto the
/// anti-diagonal, which keeps row sums, row richness, and per-species
/// occurrence counts fixed while shuffling co-occurrence.
pub fn null_independent_swap(ctx: &NullContext, params: &NullParams) -> Result<CommunityMatrix> {
    let cdm = ctx.cdm();
    let mut rng = SimpleRng::new(params.seed);
    let n_quadrats = cdm.n_quadrats();
    let n_species = cdm.n_species();

    let mut rows: Vec<Vec<u64>> = (0..n_quadrats).map(|row| cdm.row_dense(row)).collect();
    if n_quadrats < 2 || n_species < 2 {
        return rebuild(ctx, rows);
    }

    for _ in 0..params.swap_iterations {
        let r1 = rng.gen_range(n_quadrats);
        let r2 = rng.gen_range(n_quadrats);
        let c1 = rng.gen_range(n_species);
        let c2 = rng.gen_range(n_species);
        if r1 == r2 || c1 == c2 {
            continue;
        }
        let a = rows[r1][c1];
        let b = rows[r1][c2];
        let c = rows[r2][c1];
        let d = rows[r2][c2];
        if a > 0 && d > 0 && b == 0 && c == 0 {
            rows[r1][c1] = 0;
            rows[r1][c2] = a;
            rows[r2][c1] = d;
            rows[r2][c2] = 0;
        } else if a == 0 && d == 0 && b > 0 && c > 0 {
            rows[r1][c1] = b;
            rows[r1][c2] = 0;
            rows[r2][c1] = 0;
            rows[r2][c2] = c;
        }
    }
    rebuild(ctx, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_context() -> NullContext {
        let rows = vec![
            vec![4, 0, 1, 0],
            vec![0, 2, 0, 3],
            vec![1, 1, 1, 0],
            vec![0, 0, 6, 0],
        ];
        let cdm = CommunityMatrix::from_rows(
            &rows,
            (1..=4).map(|i| format!("q{}", i)).collect(),
            vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string(),
            ],
        )
        .unwrap();
        NullContext::prepare(cdm, None, None).unwrap()
    }

    fn params(seed: u64) -> NullParams {
        NullParams {
            seed,
            swap_iterations: 1000,
        }
    }

    #[test]
    fn test_richness_null_preserves_row_richness_and_abundance_multiset() {
        let ctx = create_test_context();
        let randomized = null_richness(&ctx, &params(11)).unwrap();
        assert_eq!(randomized.richness(), ctx.cdm().richness());
        for row in 0..randomized.n_quadrats() {
            let mut observed: Vec<u64> = ctx
                .cdm()
                .present_species(row)
                .iter()
                .map(|&c| ctx.cdm().get(row, c))
                .collect();
            let mut shuffled: Vec<u64> = randomized
                .present_species(row)
                .iter()
                .map(|&c| randomized.get(row, c))
                .collect();
            observed.sort_unstable();
            shuffled.sort_unstable();
            assert_eq!(observed, shuffled);
        }
    }

    #[test]
    fn test_frequency_null_preserves_occurrence_counts() {
        let ctx = create_test_context();
        let randomized = null_frequency(&ctx, &params(5)).unwrap();
        assert_eq!(randomized.occurrence_counts(), ctx.cdm().occurrence_counts());
        assert_eq!(randomized.col_sums(), ctx.cdm().col_sums());
    }

    #[test]
    fn test_regional_null_preserves_row_sums() {
        let ctx = create_test_context();
        let randomized = null_regional(&ctx, &params(17)).unwrap();
        assert_eq!(randomized.row_sums(), ctx.cdm().row_sums());
    }

    #[test]
    fn test_independent_swap_invariants() {
        let ctx = create_test_context();
        let randomized = null_independent_swap(&ctx, &params(23)).unwrap();
        assert_eq!(randomized.row_sums(), ctx.cdm().row_sums());
        assert_eq!(randomized.richness(), ctx.cdm().richness());
        assert_eq!(randomized.occurrence_counts(), ctx.cdm().occurrence_counts());
    }

    #[test]
    fn test_same_seed_reproduces() {
        let ctx = create_test_context();
        let a = null_richness(&ctx, &params(3)).unwrap();
        let b = null_richness(&ctx, &params(3)).unwrap();
        for row in 0..a.n_quadrats() {
            assert_eq!(a.row_dense(row), b.row_dense(row));
        }
    }
}
