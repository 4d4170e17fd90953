//! Line2Vec on a barbell graph with a stand-in trainer
//!
//! Run with `RUST_LOG=line2vec=debug` to see per-phase optimizer output.

use line2vec::prelude::*;
use line2vec::utils::{barbell_graph, save_json, timing::Timer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

/// Mimics a skip-gram trainer: seeded start, small random drift per round
struct JitterTrainer {
    rng: StdRng,
    scale: f64,
}

impl EmbeddingTrainer for JitterTrainer {
    fn initial_embeddings(&mut self, rows: usize, dim: usize) -> Result<EmbeddingMatrix> {
        Ok(EmbeddingMatrix::seeded(rows, dim, self.rng.gen()))
    }

    fn retrain(&mut self, embeddings: &mut EmbeddingMatrix) -> Result<()> {
        let scale = self.scale;
        let rng = &mut self.rng;
        embeddings
            .view_mut()
            .mapv_inplace(|v| v + scale * (rng.gen::<f64>() - 0.5));
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Line2Vec on a barbell graph ===\n");

    let graph = barbell_graph(5)?;
    println!(
        "Graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    let config = Line2VecConfig {
        dimensions: 16,
        eta: 0.05,
        outer_iterations: 5,
        ..Default::default()
    };

    let line2vec = {
        let _timer = Timer::new("preparation");
        Line2Vec::new(graph, config)?
    };
    println!(
        "Line graph: {} nodes, {} weighted edges, {} zero-denominator substitutions",
        line2vec.line_graph().node_count(),
        line2vec.weights().len(),
        line2vec.weights().diagnostics().len()
    );

    // The bridge sits between the two cliques
    let bridge = EdgeKey::new(4, 5);
    let inside = EdgeKey::new(3, 4);
    if let Some(weight) = line2vec.weights().weight(&inside, &bridge) {
        println!("Weight from clique edge {:?} to bridge: {:.4}", inside.endpoints(), weight);
    }

    let out_dir = std::env::temp_dir().join("line2vec_demo");
    std::fs::create_dir_all(&out_dir)?;
    let mut file = std::fs::File::create(out_dir.join("line_graph.edgelist"))?;
    line2vec.write_line_graph(&mut file)?;
    save_json(line2vec.edge_index(), out_dir.join("edge_index.json"))?;

    let mut trainer = JitterTrainer {
        rng: StdRng::seed_from_u64(2024),
        scale: 0.01,
    };
    let outcome = line2vec.fit(&mut trainer)?;

    println!("\n{}", outcome.history.summary());
    for (i, (beta, error)) in outcome
        .history
        .betas
        .iter()
        .zip(&outcome.history.penalty_errors)
        .enumerate()
    {
        println!("  iteration {}: beta = {:<8} penalty error = {:.6}", i + 1, beta, error);
    }

    save_json(&outcome.embeddings, out_dir.join("embeddings.json"))?;
    println!("\nOutputs written to {}", out_dir.display());

    Ok(())
}
