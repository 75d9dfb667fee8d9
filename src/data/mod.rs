//! Core data structures for community null-model analysis.

mod community;
mod pool;
mod table;
mod tree;

pub use community::CommunityMatrix;
pub use pool::RegionalPool;
pub use table::{GroupBy, GroupKey, MetricTable, ReplicateRow, ReplicateTable, RICHNESS};
pub use tree::PhyloTree;
