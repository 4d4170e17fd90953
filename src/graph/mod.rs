//! Graph model, edge indexing and neighbourhood tables
//!
//! Everything in this module is built once when a graph is loaded and stays
//! immutable while embeddings are optimized.

mod network;
mod edge_index;
mod incidence;

pub use network::{DegreeMode, EdgeKey, Graph, NodeId};
pub use edge_index::EdgeIndexMap;
pub use incidence::Incidence;
