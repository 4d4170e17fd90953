//! # Line2Vec: edge embeddings under collective homophily
//!
//! This library refines vector embeddings of graph edges so that every edge
//! touching a node lies inside a learned ball around that node. Embeddings
//! are learned externally on random walks over a weighted line graph; this
//! crate builds that line graph and runs the ball-fitting penalty optimizer
//! between rounds of external training.
//!
//! ## Features
//!
//! - **Graph model**: weighted (multi)graphs with stable node identifiers
//! - **Line graph weighting**: degree- and weight-proportional transition weights
//! - **Edge index map**: dense row indices aligned with the embedding matrix
//! - **Ball projection**: two-phase penalty optimizer over per-node spheres

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Graph model, edge indexing and incidence tables
pub mod graph;

/// Line graph derivation and transition weighting
pub mod line_graph;

/// Spheres, penalty oracle and the ball-projection optimizer
pub mod core;

/// Utility functions and helpers
pub mod utils;

// Re-export commonly used types
pub use crate::graph::{DegreeMode, EdgeIndexMap, EdgeKey, Graph, Incidence, NodeId};
pub use crate::line_graph::{Junction, LineGraph, LineGraphWeighter, LineGraphWeights};
pub use crate::core::{
    BallOptimizer, BetaSchedule, EmbeddingMatrix, EmbeddingTrainer, Line2Vec, Line2VecConfig,
    SphereSet,
};

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum Line2VecError {
    /// A node has no neighbours, so no enclosing ball can be initialised
    #[error("Degenerate graph: node {node} has no neighbours")]
    DegenerateGraph {
        /// The isolated node
        node: NodeId,
    },

    /// An edge is missing from the edge index map
    #[error("Inconsistent index: edge ({u}, {v}, key {key}) has no index")]
    InconsistentIndex {
        /// First endpoint
        u: NodeId,
        /// Second endpoint
        v: NodeId,
        /// Parallel-edge ordinal
        key: u32,
    },

    /// An embedding row became NaN or infinite
    #[error("Non-finite embedding in row {row} (edge {u}-{v})")]
    NonFiniteEmbedding {
        /// Row of the embedding matrix
        row: usize,
        /// First endpoint of the edge
        u: NodeId,
        /// Second endpoint of the edge
        v: NodeId,
    },

    /// A sphere centre or radius became NaN or infinite
    #[error("Non-finite sphere for node {node}")]
    NonFiniteSphere {
        /// Node owning the sphere
        node: NodeId,
    },

    /// Matrix or vector shapes disagree
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected size
        expected: usize,
        /// Size actually supplied
        found: usize,
    },

    /// A node id is not part of the graph
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// An edge weight is negative, NaN or infinite
    #[error("Invalid weight {weight} on edge ({u}, {v})")]
    InvalidWeight {
        /// First endpoint
        u: NodeId,
        /// Second endpoint
        v: NodeId,
        /// Offending weight
        weight: f64,
    },

    /// Hyperparameters failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the library
pub type Result<T> = std::result::Result<T, Line2VecError>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        core::{
            measure_penalty_error, BallOptimizer, BetaSchedule, EmbeddingMatrix,
            EmbeddingTrainer, FitOutcome, Line2Vec, Line2VecConfig, OptimizationHistory,
            SphereSet,
        },
        graph::{DegreeMode, EdgeIndexMap, EdgeKey, Graph, Incidence, NodeId},
        line_graph::{Junction, LineGraph, LineGraphWeighter, LineGraphWeights},
        Line2VecError, Result,
    };
}
