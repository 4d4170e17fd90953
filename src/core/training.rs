//! Orchestration: interleave external embedding training with ball projection

use std::io::Write;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{BallOptimizer, EmbeddingMatrix, Line2VecConfig, SphereSet};
use crate::graph::{EdgeIndexMap, Graph, Incidence};
use crate::line_graph::{LineGraph, LineGraphWeighter, LineGraphWeights};
use crate::utils::timing::Timer;
use crate::{Line2VecError, Result};

/// Source and sink of edge embeddings
///
/// Implementations wrap a sequence-embedding trainer fed with walks over the
/// weighted line graph. Row `i` of every matrix embeds the edge with index
/// `i` in the [`EdgeIndexMap`].
pub trait EmbeddingTrainer {
    /// Produce the first `rows × dim` embedding
    fn initial_embeddings(&mut self, rows: usize, dim: usize) -> Result<EmbeddingMatrix>;

    /// Continue training from the projected embedding, updating it in place
    fn retrain(&mut self, embeddings: &mut EmbeddingMatrix) -> Result<()>;
}

/// Trainer that only supplies a seeded random start and never retrains
#[derive(Clone, Debug)]
pub struct SeededEmbeddings {
    seed: u64,
}

impl SeededEmbeddings {
    /// Create with a fixed seed
    pub fn new(seed: u64) -> Self {
        SeededEmbeddings { seed }
    }
}

impl EmbeddingTrainer for SeededEmbeddings {
    fn initial_embeddings(&mut self, rows: usize, dim: usize) -> Result<EmbeddingMatrix> {
        Ok(EmbeddingMatrix::seeded(rows, dim, self.seed))
    }

    fn retrain(&mut self, _embeddings: &mut EmbeddingMatrix) -> Result<()> {
        Ok(())
    }
}

/// Penalty error and β across a run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OptimizationHistory {
    /// Error of the freshly initialised balls
    pub initial_error: f64,
    /// Error after each outer iteration's projection
    pub penalty_errors: Vec<f64>,
    /// β used in each outer iteration
    pub betas: Vec<f64>,
    /// Error after the final projection, if one ran
    pub final_error: Option<f64>,
    /// Total wall time of the run
    pub total_time: Duration,
}

impl OptimizationHistory {
    /// Start a history at the given error
    pub fn new(initial_error: f64) -> Self {
        OptimizationHistory {
            initial_error,
            ..Default::default()
        }
    }

    /// Record one outer iteration
    pub fn record(&mut self, beta: f64, error: f64) {
        self.betas.push(beta);
        self.penalty_errors.push(error);
    }

    /// Error of the latest state
    pub fn last_error(&self) -> f64 {
        self.final_error
            .or_else(|| self.penalty_errors.last().copied())
            .unwrap_or(self.initial_error)
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "Initial penalty error: {:.6}\nOuter iterations: {}\nFinal penalty error: {:.6}\nFinal beta: {}\nTotal time: {:.2}s",
            self.initial_error,
            self.penalty_errors.len(),
            self.last_error(),
            self.betas.last().copied().unwrap_or(0.0),
            self.total_time.as_secs_f32()
        )
    }
}

/// Result of [`Line2Vec::fit`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FitOutcome {
    /// Projected edge embeddings
    pub embeddings: EmbeddingMatrix,
    /// Fitted node balls
    pub spheres: SphereSet,
    /// Error trace
    pub history: OptimizationHistory,
}

/// A graph prepared for Line2Vec
///
/// Construction resolves every lookup once: edge index, incidence tables
/// and the weighted line graph never change afterwards.
pub struct Line2Vec {
    graph: Graph,
    config: Line2VecConfig,
    edge_index: EdgeIndexMap,
    incidence: Incidence,
    line_graph: LineGraph,
    weights: LineGraphWeights,
}

impl Line2Vec {
    /// Prepare `graph`, indexing edges in insertion order
    pub fn new(graph: Graph, config: Line2VecConfig) -> Result<Self> {
        let edge_index = EdgeIndexMap::from_graph(&graph);
        Self::with_edge_index(graph, edge_index, config)
    }

    /// Prepare `graph` against an existing (e.g. persisted) edge index
    pub fn with_edge_index(
        graph: Graph,
        edge_index: EdgeIndexMap,
        config: Line2VecConfig,
    ) -> Result<Self> {
        let _timer = Timer::new("line2vec setup");
        config.validate()?;

        if let Some(&node) = graph.isolated_nodes().first() {
            return Err(Line2VecError::DegenerateGraph { node });
        }

        let incidence = Incidence::build(&graph, &edge_index)?;
        let line_graph = LineGraph::derive(&graph)?;
        let weights = LineGraphWeighter::new(config.epsilon)
            .with_degree_mode(config.degree_mode)
            .weigh(&graph, &line_graph)?;

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            directed = graph.is_directed(),
            line_graph_edges = weights.len(),
            "prepared graph"
        );

        Ok(Line2Vec {
            graph,
            config,
            edge_index,
            incidence,
            line_graph,
            weights,
        })
    }

    /// The input graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Run configuration
    pub fn config(&self) -> &Line2VecConfig {
        &self.config
    }

    /// Edge to row mapping
    pub fn edge_index(&self) -> &EdgeIndexMap {
        &self.edge_index
    }

    /// Node neighbourhood tables
    pub fn incidence(&self) -> &Incidence {
        &self.incidence
    }

    /// Unweighted line graph
    pub fn line_graph(&self) -> &LineGraph {
        &self.line_graph
    }

    /// Line-graph transition weights
    pub fn weights(&self) -> &LineGraphWeights {
        &self.weights
    }

    /// Write the weighted line graph as `u v weight` lines over edge indices
    pub fn write_line_graph<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.weights.write_edgelist(writer, &self.edge_index)
    }

    /// Learn edge embeddings, alternating projection and retraining
    ///
    /// Balls are initialised from the trainer's first matrix. Every outer
    /// iteration projects, lets the trainer continue from the projected
    /// matrix and advances β; a last projection follows unless disabled.
    pub fn fit<T: EmbeddingTrainer>(&self, trainer: &mut T) -> Result<FitOutcome> {
        let start = Instant::now();
        let rows = self.edge_index.len();
        let dim = self.config.dimensions;

        let embeddings = trainer.initial_embeddings(rows, dim)?;
        embeddings.check_shape(rows, dim)?;
        let spheres = SphereSet::initialize(&embeddings, &self.incidence)?;

        let mut optimizer = BallOptimizer::new(embeddings, spheres, &self.incidence, self.config.eta)?
            .with_max_backtracks(self.config.max_backtracks);
        let mut history = OptimizationHistory::new(optimizer.penalty_error()?);

        let mut beta = self.config.beta;
        info!(
            beta,
            eta = self.config.eta,
            penalty_error = history.initial_error,
            "initialised balls"
        );

        for iteration in 0..self.config.outer_iterations {
            let error = optimizer.advance(beta)?;
            history.record(beta, error);
            info!(iteration = iteration + 1, beta, penalty_error = error, "outer iteration");

            trainer.retrain(optimizer.embeddings_mut())?;
            optimizer.embeddings().check_shape(rows, dim)?;
            beta = self.config.beta_schedule.next(beta);
        }

        if self.config.final_projection {
            let error = optimizer.advance(beta)?;
            history.final_error = Some(error);
            info!(beta, penalty_error = error, "final projection");
        }

        let (embeddings, spheres) = optimizer.into_parts();
        history.total_time = start.elapsed();
        info!(summary = %history.summary(), "fit complete");

        Ok(FitOutcome {
            embeddings,
            spheres,
            history,
        })
    }
}
