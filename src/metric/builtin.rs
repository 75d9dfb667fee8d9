//! Built-in community structure metrics.
//!
//! Every metric shares the same per-row contract: given the prepared context
//! and a row index, return one scalar, or NaN where the row cannot support
//! the metric (fewer than 2 species for distance-based metrics, empty rows
//! for PD). NaN is a per-cell outcome, never a batch failure.

use crate::metric::MetricContext;

/// Species richness: count of species with non-zero abundance.
pub fn metric_richness(ctx: &MetricContext, row: usize) -> f64 {
    ctx.cdm().present_species(row).len() as f64
}

/// Mean pairwise cophenetic distance among species present in the row.
pub fn metric_mpd(ctx: &MetricContext, row: usize) -> f64 {
    let Some(dist) = ctx.cophenetic() else {
        return f64::NAN;
    };
    let present = ctx.cdm().present_species(row);
    if present.len() < 2 {
        return f64::NAN;
    }
    let mut sum = 0.0;
    let mut n_pairs = 0usize;
    for (i, &si) in present.iter().enumerate() {
        for &sj in &present[(i + 1)..] {
            sum += dist[(si, sj)];
            n_pairs += 1;
        }
    }
    sum / n_pairs as f64
}

/// Abundance-weighted mean pairwise distance: each species pair contributes
/// with weight `n_i * n_j`.
pub fn metric_mpd_abund(ctx: &MetricContext, row: usize) -> f64 {
    let Some(dist) = ctx.cophenetic() else {
        return f64::NAN;
    };
    let present = ctx.cdm().present_species(row);
    if present.len() < 2 {
        return f64::NAN;
    }
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (i, &si) in present.iter().enumerate() {
        let ni = ctx.cdm().get(row, si) as f64;
        for &sj in &present[(i + 1)..] {
            let w = ni * ctx.cdm().get(row, sj) as f64;
            weighted_sum += w * dist[(si, sj)];
            weight_total += w;
        }
    }
    weighted_sum / weight_total
}

/// Mean nearest-taxon distance: for each present species, the distance to
/// its closest present relative, averaged over species.
pub fn metric_mntd(ctx: &MetricContext, row: usize) -> f64 {
    let Some(dist) = ctx.cophenetic() else {
        return f64::NAN;
    };
    let present = ctx.cdm().present_species(row);
    if present.len() < 2 {
        return f64::NAN;
    }
    let mut sum = 0.0;
    for &si in &present {
        let nearest = present
            .iter()
            .filter(|&&sj| sj != si)
            .map(|&sj| dist[(si, sj)])
            .fold(f64::INFINITY, f64::min);
        sum += nearest;
    }
    sum / present.len() as f64
}

/// Faith's phylogenetic diversity: total branch length spanning the row's
/// species, root-inclusive.
pub fn metric_pd(ctx: &MetricContext, row: usize) -> f64 {
    let Some(tree) = ctx.tree() else {
        return f64::NAN;
    };
    let present = ctx.cdm().present_species(row);
    if present.is_empty() {
        return f64::NAN;
    }
    let labels: Vec<String> = present
        .iter()
        .map(|&col| ctx.cdm().species_ids()[col].clone())
        .collect();
    match tree.pd(&labels) {
        Ok(pd) => pd,
        // The context prunes the tree to the matrix species, so every label
        // resolves; an error here means the context invariant was broken.
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CommunityMatrix, PhyloTree};
    use approx::assert_relative_eq;

    fn create_test_context() -> MetricContext {
        // ((a:1,b:1):1,(c:1,d:1):1);
        // distances: a-b = 2, a-c = a-d = b-c = b-d = 4, c-d = 2
        let tree = PhyloTree::from_newick("((a:1,b:1):1,(c:1,d:1):1);").unwrap();
        let rows = vec![
            vec![1, 1, 0, 0], // close pair
            vec![2, 0, 1, 0], // distant pair
            vec![1, 1, 1, 1], // everything
            vec![0, 5, 0, 0], // singleton
            vec![0, 0, 0, 0], // empty
        ];
        let cdm = CommunityMatrix::from_rows(
            &rows,
            (1..=5).map(|i| format!("q{}", i)).collect(),
            vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string(),
            ],
        )
        .unwrap();
        MetricContext::prepare(cdm, Some(&tree), None).unwrap()
    }

    #[test]
    fn test_richness() {
        let ctx = create_test_context();
        assert_eq!(metric_richness(&ctx, 0), 2.0);
        assert_eq!(metric_richness(&ctx, 2), 4.0);
        assert_eq!(metric_richness(&ctx, 4), 0.0);
    }

    #[test]
    fn test_mpd() {
        let ctx = create_test_context();
        assert_relative_eq!(metric_mpd(&ctx, 0), 2.0);
        assert_relative_eq!(metric_mpd(&ctx, 1), 4.0);
        // all pairs: (2 + 4 + 4 + 4 + 4 + 2) / 6
        assert_relative_eq!(metric_mpd(&ctx, 2), 20.0 / 6.0);
        assert!(metric_mpd(&ctx, 3).is_nan());
        assert!(metric_mpd(&ctx, 4).is_nan());
    }

    #[test]
    fn test_mpd_abund_equals_mpd_for_even_abundance() {
        let ctx = create_test_context();
        // Row 2 has abundance 1 everywhere, so weighting changes nothing.
        assert_relative_eq!(metric_mpd_abund(&ctx, 2), metric_mpd(&ctx, 2));
        // Row 1: single pair, weights cancel.
        assert_relative_eq!(metric_mpd_abund(&ctx, 1), 4.0);
    }

    #[test]
    fn test_mntd() {
        let ctx = create_test_context();
        assert_relative_eq!(metric_mntd(&ctx, 0), 2.0);
        // every species' nearest neighbour is its cherry partner
        assert_relative_eq!(metric_mntd(&ctx, 2), 2.0);
        assert!(metric_mntd(&ctx, 3).is_nan());
    }

    #[test]
    fn test_pd() {
        let ctx = create_test_context();
        // a + b + their stem: 1 + 1 + 1
        assert_relative_eq!(metric_pd(&ctx, 0), 3.0);
        // whole tree
        assert_relative_eq!(metric_pd(&ctx, 2), 6.0);
        // singleton b: path to root
        assert_relative_eq!(metric_pd(&ctx, 3), 2.0);
        assert!(metric_pd(&ctx, 4).is_nan());
    }

    #[test]
    fn test_tree_metrics_nan_without_tree() {
        let rows = vec![vec![1, 1]];
        let cdm = CommunityMatrix::from_rows(
            &rows,
            vec!["q1".to_string()],
            vec!["a".to_string(), "b".to_string()],
        )
        .unwrap();
        let ctx = MetricContext::prepare(cdm, None, None).unwrap();
        assert!(metric_mpd(&ctx, 0).is_nan());
        assert!(metric_pd(&ctx, 0).is_nan());
        assert_eq!(metric_richness(&ctx, 0), 2.0);
    }
}
