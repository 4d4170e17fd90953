//! Edge embeddings, node balls and the projection loop

mod config;
mod embedding;
mod optimizer;
mod penalty;
mod sphere;
mod training;

pub use config::{BetaSchedule, Line2VecConfig};
pub use embedding::EmbeddingMatrix;
pub use optimizer::{BallOptimizer, DEFAULT_MAX_BACKTRACKS};
pub use penalty::{measure_penalty_error, node_penalty_error, violation};
pub use sphere::SphereSet;
pub use training::{
    EmbeddingTrainer, FitOutcome, Line2Vec, OptimizationHistory, SeededEmbeddings,
};
