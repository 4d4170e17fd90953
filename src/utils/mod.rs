//! Utility functions for Line2Vec

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::Result;

/// Save object to JSON file
pub fn save_json<T: Serialize, P: AsRef<Path>>(obj: &T, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, obj)?;
    writer.flush()?;
    Ok(())
}

/// Load object from JSON file
pub fn load_json<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    let obj = serde_json::from_reader(reader)?;
    Ok(obj)
}

/// Two `clique`-node cliques joined by a single bridge edge
///
/// Nodes `0..clique` form the first clique and `clique..2 * clique` the
/// second; the bridge is `(clique - 1, clique)`.
pub fn barbell_graph(clique: u64) -> Result<Graph> {
    let mut graph = Graph::undirected();
    for offset in [0, clique] {
        for u in 0..clique {
            for v in (u + 1)..clique {
                graph.add_edge(offset + u, offset + v, 1.0)?;
            }
        }
    }
    if clique > 0 {
        graph.add_edge(clique - 1, clique, 1.0)?;
    }
    Ok(graph)
}

/// Random undirected graph with no isolated nodes
///
/// A path over all nodes guarantees every node has a neighbour; `extra`
/// further edges are drawn uniformly, parallel edges included.
pub fn random_graph(nodes: u64, extra: usize, seed: u64) -> Result<Graph> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = Graph::undirected();
    for u in 1..nodes {
        graph.add_edge(u - 1, u, 1.0)?;
    }
    if nodes > 1 {
        for _ in 0..extra {
            let u = rng.gen_range(0..nodes);
            let v = rng.gen_range(0..nodes);
            graph.add_edge(u, v, rng.gen_range(0.5..2.0))?;
        }
    }
    Ok(graph)
}

/// Timing utilities
pub mod timing {
    use std::time::{Duration, Instant};
    use tracing::debug;

    /// Logs the lifetime of a scope at debug level
    pub struct Timer {
        start: Instant,
        name: String,
    }

    impl Timer {
        /// Start new timer
        pub fn new(name: &str) -> Self {
            Timer {
                start: Instant::now(),
                name: name.to_string(),
            }
        }

        /// Get elapsed time
        pub fn elapsed(&self) -> Duration {
            self.start.elapsed()
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            debug!(
                timer = %self.name,
                elapsed_ms = self.elapsed().as_secs_f64() * 1000.0,
                "finished"
            );
        }
    }
}
