//! Null models and the randomization engine.

mod context;
mod engine;
pub mod models;

pub use context::{NullContext, NullParams};
pub use engine::{run_nulls, RandomizeConfig};
