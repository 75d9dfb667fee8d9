//! Error types for the phylostruct library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum PhyloError {
    #[error("Unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("Unknown null model '{0}'")]
    UnknownNull(String),

    #[error(
        "Infeasible quadrat placement: expected cover {cover:.3} exceeds {max_cover:.2} \
         (count * quadrat_length^2 / arena_length^2 must stay below the bound)"
    )]
    InfeasiblePlacement { cover: f64, max_cover: f64 },

    #[error("Placement retries exhausted for quadrat {quadrat} after {attempts} attempts")]
    PlacementRetriesExhausted { quadrat: usize, attempts: usize },

    #[error("Unmatched grouping key '{0}' when merging observed and summary rows")]
    UnmatchedGroupingKey(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Species mismatch: {0}")]
    SpeciesMismatch(String),

    #[error("Newick parse error: {0}")]
    NewickParse(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, PhyloError>;
