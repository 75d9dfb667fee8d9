//! Random placement of non-overlapping square quadrats in a square arena.

use crate::error::{PhyloError, Result};
use serde::{Deserialize, Serialize};

/// Maximum expected covered fraction before placement is refused outright.
///
/// Beyond this density the rejection sampler's retry count grows quickly, so
/// the check converts an unbounded-runtime risk into a precondition failure.
pub const MAX_COVER: f64 = 0.4;

/// Per-quadrat cap on rejection-sampling attempts. The density precondition
/// bounds the *expected* retries but cannot rule out pathological sequences,
/// so a hard cap turns those into an explicit failure.
pub const MAX_PLACEMENT_RETRIES: usize = 10_000;

/// Axis-aligned bounding box of one placed quadrat.
///
/// Placement order is quadrat identity: the i-th bounds record corresponds to
/// quadrat i+1 in the community matrix built from the arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadratBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl QuadratBounds {
    /// Whether two bounding boxes overlap.
    ///
    /// Interval test on both axes, closed intervals: boxes sharing only an
    /// edge count as overlapping, so a point on a boundary can never belong
    /// to two quadrats.
    pub fn overlaps(&self, other: &QuadratBounds) -> bool {
        let x_overlap = self.x_min <= other.x_max && other.x_min <= self.x_max;
        let y_overlap = self.y_min <= other.y_max && other.y_min <= self.y_max;
        x_overlap && y_overlap
    }

    /// Whether a point falls inside this quadrat (closed bounds).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Side length along x (equal to the y side for square quadrats).
    pub fn side(&self) -> f64 {
        self.x_max - self.x_min
    }
}

/// Minimal xorshift64 generator for reproducible placement.
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
}

/// Place `count` non-overlapping square quadrats of side `quadrat_length`
/// inside a square arena of side `arena_length`.
///
/// Origins are drawn as uniform random integers in `[0, A - L]` on both axes
/// and candidates are rejected until they clear every previously accepted
/// quadrat. Fails with `InfeasiblePlacement` before any draw if the expected
/// covered fraction `count * L^2 / A^2` exceeds [`MAX_COVER`], and with
/// `PlacementRetriesExhausted` if a single quadrat burns through
/// [`MAX_PLACEMENT_RETRIES`] candidates.
pub fn place_quadrats(
    count: usize,
    arena_length: f64,
    quadrat_length: f64,
    seed: u64,
) -> Result<Vec<QuadratBounds>> {
    if count == 0 {
        return Err(PhyloError::InvalidParameter(
            "quadrat count must be at least 1".to_string(),
        ));
    }
    if !(arena_length > 0.0) || !(quadrat_length > 0.0) {
        return Err(PhyloError::InvalidParameter(
            "arena and quadrat lengths must be positive".to_string(),
        ));
    }
    if quadrat_length > arena_length {
        return Err(PhyloError::InvalidParameter(
            "quadrat length exceeds arena length".to_string(),
        ));
    }

    let cover = count as f64 * (quadrat_length * quadrat_length)
        / (arena_length * arena_length);
    if cover > MAX_COVER {
        return Err(PhyloError::InfeasiblePlacement {
            cover,
            max_cover: MAX_COVER,
        });
    }

    let span = (arena_length - quadrat_length).floor() as u64;
    let mut rng = SimpleRng::new(seed);
    let mut placed: Vec<QuadratBounds> = Vec::with_capacity(count);

    for quadrat in 0..count {
        let mut attempts = 0;
        loop {
            attempts += 1;
            if attempts > MAX_PLACEMENT_RETRIES {
                return Err(PhyloError::PlacementRetriesExhausted {
                    quadrat: quadrat + 1,
                    attempts: MAX_PLACEMENT_RETRIES,
                });
            }
            let x = (rng.next_u64() % (span + 1)) as f64;
            let y = (rng.next_u64() % (span + 1)) as f64;
            let candidate = QuadratBounds {
                x_min: x,
                x_max: x + quadrat_length,
                y_min: y,
                y_max: y + quadrat_length,
            };
            if placed.iter().all(|q| !q.overlaps(&candidate)) {
                placed.push(candidate);
                break;
            }
        }
    }

    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_places_requested_count_within_arena() {
        let bounds = place_quadrats(10, 100.0, 10.0, 42).unwrap();
        assert_eq!(bounds.len(), 10);
        for b in &bounds {
            assert!(b.x_min >= 0.0 && b.x_max <= 100.0);
            assert!(b.y_min >= 0.0 && b.y_max <= 100.0);
            assert_eq!(b.side(), 10.0);
        }
    }

    #[test]
    fn test_no_pair_overlaps() {
        let bounds = place_quadrats(15, 100.0, 10.0, 7).unwrap();
        for i in 0..bounds.len() {
            for j in (i + 1)..bounds.len() {
                assert!(
                    !bounds[i].overlaps(&bounds[j]),
                    "quadrats {} and {} overlap",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_infeasible_density_fails_fast() {
        // count=10, A=10, L=5: cover = 10 * 25 / 100 = 2.5
        let result = place_quadrats(10, 10.0, 5.0, 42);
        match result {
            Err(PhyloError::InfeasiblePlacement { cover, max_cover }) => {
                assert!(cover > max_cover);
            }
            other => panic!("expected InfeasiblePlacement, got {:?}", other),
        }
    }

    #[test]
    fn test_reproducible_for_same_seed() {
        let a = place_quadrats(5, 50.0, 5.0, 99).unwrap();
        let b = place_quadrats(5, 50.0, 5.0, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(place_quadrats(0, 100.0, 10.0, 1).is_err());
        assert!(place_quadrats(1, 0.0, 10.0, 1).is_err());
        assert!(place_quadrats(1, 10.0, 20.0, 1).is_err());
    }

    #[test]
    fn test_shared_edge_counts_as_overlap() {
        let a = QuadratBounds {
            x_min: 0.0,
            x_max: 10.0,
            y_min: 0.0,
            y_max: 10.0,
        };
        let b = QuadratBounds {
            x_min: 10.0,
            x_max: 20.0,
            y_min: 0.0,
            y_max: 10.0,
        };
        let c = QuadratBounds {
            x_min: 11.0,
            x_max: 21.0,
            y_min: 0.0,
            y_max: 10.0,
        };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_contains() {
        let b = QuadratBounds {
            x_min: 2.0,
            x_max: 5.0,
            y_min: 2.0,
            y_max: 5.0,
        };
        assert!(b.contains(3.0, 4.0));
        assert!(b.contains(2.0, 5.0)); // boundary is inside
        assert!(!b.contains(1.9, 4.0));
    }
}
