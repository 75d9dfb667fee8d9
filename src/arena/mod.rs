//! Spatial arena sampling: quadrat placement and community-matrix construction.

mod placer;
mod sample;

pub use placer::{place_quadrats, QuadratBounds, MAX_COVER, MAX_PLACEMENT_RETRIES};
pub use sample::{place_and_sample, sample_quadrats, SpatialArena};
