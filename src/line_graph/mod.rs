//! Line graph construction and transition weighting
//!
//! The line graph has one node per original edge; two of them are joined when
//! the original edges meet at a vertex. Walks over the weighted line graph are
//! generated outside this crate and feed the edge embedding trainer.

mod junction;
mod structure;
mod weighting;

pub use junction::Junction;
pub use structure::LineGraph;
pub use weighting::{
    LineGraphWeighter, LineGraphWeights, WeightedPair, ZeroDenominator, DEFAULT_EPSILON,
    DEFAULT_PARALLEL_THRESHOLD,
};
