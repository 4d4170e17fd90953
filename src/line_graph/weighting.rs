//! Transition weights for the line graph
//!
//! Every original edge `(u, v)` first gets a modified weight
//! `max(ln(D / (d(u) d(v))) + ε, ε)` where `D` is the total degree. Each node
//! accumulates the modified weights of its edges. A line-graph edge
//! `(e1, e2)` meeting at `common` is then weighted, once per direction, by
//!
//! ```text
//! degree factor = 1                       if d(far) == 1
//!               = d(far) / (d(far) + d(common))  otherwise
//! weight factor = w(other) / (W(common) - w(this))
//! ```
//!
//! and the final weight is the mean of both directions.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use tracing::{debug, info, warn};

use super::{Junction, LineGraph};
use crate::graph::{DegreeMode, EdgeIndexMap, EdgeKey, Graph, NodeId};
use crate::{Line2VecError, Result};

/// Default floor for modified edge weights
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Line-graph size above which pairs are weighted on the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// One weighted line-graph edge
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedPair {
    /// First original edge
    pub first: EdgeKey,
    /// Second original edge
    pub second: EdgeKey,
    /// Transition weight
    pub weight: f64,
}

/// A weight-contribution factor replaced by zero
///
/// Raised when the accumulated weight of `common` equals the modified weight
/// of `source_edge`, which would divide by zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZeroDenominator {
    /// Edge playing the source role
    pub source_edge: EdgeKey,
    /// Edge whose weight was being redistributed
    pub other_edge: EdgeKey,
    /// Shared vertex
    pub common: NodeId,
}

/// Computes line-graph transition weights from a graph
#[derive(Clone, Debug)]
pub struct LineGraphWeighter {
    epsilon: f64,
    degree_mode: DegreeMode,
    parallel_threshold: usize,
}

impl Default for LineGraphWeighter {
    fn default() -> Self {
        LineGraphWeighter {
            epsilon: DEFAULT_EPSILON,
            degree_mode: DegreeMode::Count,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Read-only tables shared by every pair
struct WeightTables {
    degrees: HashMap<NodeId, f64>,
    edge_weights: HashMap<EdgeKey, f64>,
    node_weights: HashMap<NodeId, f64>,
}

impl WeightTables {
    fn degree(&self, node: NodeId) -> Result<f64> {
        self.degrees
            .get(&node)
            .copied()
            .ok_or(Line2VecError::UnknownNode(node))
    }

    fn edge_weight(&self, key: &EdgeKey) -> Result<f64> {
        self.edge_weights
            .get(&key.canonical())
            .copied()
            .ok_or(Line2VecError::InconsistentIndex {
                u: key.source,
                v: key.target,
                key: key.key,
            })
    }

    fn node_weight(&self, node: NodeId) -> Result<f64> {
        self.node_weights
            .get(&node)
            .copied()
            .ok_or(Line2VecError::UnknownNode(node))
    }
}

struct PairOutcome {
    pair: WeightedPair,
    diagnostics: Vec<ZeroDenominator>,
}

impl LineGraphWeighter {
    /// Create a weighter with the given ε floor
    pub fn new(epsilon: f64) -> Self {
        LineGraphWeighter {
            epsilon,
            ..Default::default()
        }
    }

    /// Measure degrees by count or by weight
    pub fn with_degree_mode(mut self, mode: DegreeMode) -> Self {
        self.degree_mode = mode;
        self
    }

    /// Set the pair count above which weighting runs in parallel
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Modified weight of every edge, keyed by its canonical key
    pub fn modified_edge_weights(
        &self,
        graph: &Graph,
        degrees: &HashMap<NodeId, f64>,
    ) -> Result<HashMap<EdgeKey, f64>> {
        let total_degree: f64 = degrees.values().sum();
        debug!(total_degree, "total degree of the graph");

        graph
            .edge_keys()
            .iter()
            .map(|key| {
                let du = degrees
                    .get(&key.source)
                    .copied()
                    .ok_or(Line2VecError::UnknownNode(key.source))?;
                let dv = degrees
                    .get(&key.target)
                    .copied()
                    .ok_or(Line2VecError::UnknownNode(key.target))?;
                let weight = ((total_degree / (du * dv)).ln() + self.epsilon).max(self.epsilon);
                let weight = if weight.is_finite() {
                    weight
                } else {
                    warn!(u = key.source, v = key.target, "zero endpoint degree, using ε floor");
                    self.epsilon
                };
                Ok((key.canonical(), weight))
            })
            .collect()
    }

    /// Sum of modified weights of the edges touching each node
    pub fn node_weights(
        &self,
        graph: &Graph,
        edge_weights: &HashMap<EdgeKey, f64>,
    ) -> Result<HashMap<NodeId, f64>> {
        graph
            .nodes()
            .map(|node| {
                let mut total = 0.0;
                for key in graph.incident_edges(node)? {
                    total += edge_weights.get(&key.canonical()).copied().ok_or(
                        Line2VecError::InconsistentIndex {
                            u: key.source,
                            v: key.target,
                            key: key.key,
                        },
                    )?;
                }
                Ok((node, total))
            })
            .collect()
    }

    /// Weigh every edge of `line_graph`, which must be derived from `graph`
    pub fn weigh(&self, graph: &Graph, line_graph: &LineGraph) -> Result<LineGraphWeights> {
        let degrees = graph.degrees(self.degree_mode)?;
        let edge_weights = self.modified_edge_weights(graph, &degrees)?;
        let node_weights = self.node_weights(graph, &edge_weights)?;
        let tables = WeightTables {
            degrees,
            edge_weights,
            node_weights,
        };

        let pairs: Vec<(EdgeKey, EdgeKey)> = line_graph.pairs().collect();
        let weigh_one = |&(first, second): &(EdgeKey, EdgeKey)| self.weigh_pair(&tables, first, second);

        let outcomes: Vec<PairOutcome> = if pairs.len() > self.parallel_threshold {
            pairs.par_iter().map(weigh_one).collect::<Result<_>>()?
        } else {
            pairs.iter().map(weigh_one).collect::<Result<_>>()?
        };

        let mut weighted = Vec::with_capacity(outcomes.len());
        let mut diagnostics = Vec::new();
        for outcome in outcomes {
            for diagnostic in &outcome.diagnostics {
                warn!(
                    common = diagnostic.common,
                    source_edge = ?diagnostic.source_edge,
                    other_edge = ?diagnostic.other_edge,
                    "zero weight denominator, contribution set to 0"
                );
            }
            diagnostics.extend(outcome.diagnostics);
            weighted.push(outcome.pair);
        }

        info!(
            line_graph_nodes = line_graph.node_count(),
            line_graph_edges = weighted.len(),
            zero_denominators = diagnostics.len(),
            "weighted line graph"
        );

        Ok(LineGraphWeights::new(weighted, diagnostics))
    }

    fn weigh_pair(&self, tables: &WeightTables, first: EdgeKey, second: EdgeKey) -> Result<PairOutcome> {
        let junction = Junction::resolve(&first, &second);
        let common = junction.common();
        let common_degree = tables.degree(common)?;
        let common_weight = tables.node_weight(common)?;
        let first_weight = tables.edge_weight(&first)?;
        let second_weight = tables.edge_weight(&second)?;

        let mut diagnostics = Vec::new();

        let forward = degree_factor(tables.degree(junction.start())?, common_degree)
            * weight_factor(common_weight, first_weight, second_weight).unwrap_or_else(|| {
                diagnostics.push(ZeroDenominator {
                    source_edge: first,
                    other_edge: second,
                    common,
                });
                0.0
            });

        let backward = degree_factor(tables.degree(junction.end())?, common_degree)
            * weight_factor(common_weight, second_weight, first_weight).unwrap_or_else(|| {
                diagnostics.push(ZeroDenominator {
                    source_edge: second,
                    other_edge: first,
                    common,
                });
                0.0
            });

        Ok(PairOutcome {
            pair: WeightedPair {
                first,
                second,
                weight: (forward + backward) / 2.0,
            },
            diagnostics,
        })
    }
}

fn degree_factor(far_degree: f64, common_degree: f64) -> f64 {
    if far_degree == 1.0 {
        return 1.0;
    }
    let total = far_degree + common_degree;
    if total > 0.0 {
        far_degree / total
    } else {
        0.0
    }
}

/// `None` when the denominator is exactly zero
fn weight_factor(common_weight: f64, this_weight: f64, other_weight: f64) -> Option<f64> {
    let denominator = common_weight - this_weight;
    if denominator == 0.0 {
        None
    } else {
        Some(other_weight / denominator)
    }
}

/// Weighted line graph ready for a walk generator
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineGraphWeights {
    pairs: Vec<WeightedPair>,
    diagnostics: Vec<ZeroDenominator>,
    lookup: HashMap<(EdgeKey, EdgeKey), usize>,
}

impl LineGraphWeights {
    fn new(pairs: Vec<WeightedPair>, diagnostics: Vec<ZeroDenominator>) -> Self {
        let lookup = pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| ((pair.first, pair.second), i))
            .collect();
        LineGraphWeights {
            pairs,
            diagnostics,
            lookup,
        }
    }

    /// Number of weighted line-graph edges
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no line-graph edges
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// All weighted pairs in line-graph order
    pub fn iter(&self) -> impl Iterator<Item = &WeightedPair> {
        self.pairs.iter()
    }

    /// Weight of the line-graph edge between two original edges, either order
    pub fn weight(&self, first: &EdgeKey, second: &EdgeKey) -> Option<f64> {
        self.lookup
            .get(&(*first, *second))
            .or_else(|| self.lookup.get(&(*second, *first)))
            .map(|&i| self.pairs[i].weight)
    }

    /// Zero-denominator substitutions made while weighting
    pub fn diagnostics(&self) -> &[ZeroDenominator] {
        &self.diagnostics
    }

    /// Weighted edges keyed by dense edge indices
    pub fn to_indexed(&self, index: &EdgeIndexMap) -> Result<Vec<(usize, usize, f64)>> {
        self.pairs
            .iter()
            .map(|pair| Ok((index.require(&pair.first)?, index.require(&pair.second)?, pair.weight)))
            .collect()
    }

    /// Write `u v weight` lines keyed by dense edge indices
    pub fn write_edgelist<W: Write>(&self, writer: &mut W, index: &EdgeIndexMap) -> Result<()> {
        for (u, v, weight) in self.to_indexed(index)? {
            writeln!(writer, "{} {} {}", u, v, weight)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn weigh(graph: &Graph) -> LineGraphWeights {
        let line = LineGraph::derive(graph).unwrap();
        LineGraphWeighter::default().weigh(graph, &line).unwrap()
    }

    #[test]
    fn test_cycle_weights_are_equal() {
        let graph = Graph::from_unweighted_edges(false, vec![(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let weights = weigh(&graph);

        assert_eq!(weights.len(), 4);
        for pair in weights.iter() {
            // degree factor 2 / 4, weight factor w / (2w - w)
            assert!((pair.weight - 0.5).abs() < 1e-12);
        }
        assert!(weights.diagnostics().is_empty());
    }

    #[test]
    fn test_modified_edge_weights() {
        let graph = Graph::from_unweighted_edges(false, vec![(0, 1), (1, 2)]).unwrap();
        let weighter = LineGraphWeighter::default();
        let degrees = graph.degrees(DegreeMode::Count).unwrap();
        let weights = weighter.modified_edge_weights(&graph, &degrees).unwrap();

        // total degree 4, endpoints 1 and 2
        let expected = (4.0f64 / 2.0).ln() + DEFAULT_EPSILON;
        assert!((weights[&EdgeKey::new(0, 1)] - expected).abs() < 1e-12);
        assert!((weights[&EdgeKey::new(1, 2)] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_floor_applies_to_dense_pairs() {
        // every node has degree 3 in K4: ln(12 / 9) > 0, still above the floor
        let graph = Graph::from_unweighted_edges(
            false,
            vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)],
        )
        .unwrap();
        let weighter = LineGraphWeighter::new(0.1);
        let degrees = graph.degrees(DegreeMode::Count).unwrap();
        let weights = weighter.modified_edge_weights(&graph, &degrees).unwrap();
        for w in weights.values() {
            assert!((w - ((12.0f64 / 9.0).ln() + 0.1)).abs() < 1e-12);
        }

        // hub-and-leaf: ln(2 / 1) with a huge ε is dominated by ε
        let star = Graph::from_unweighted_edges(false, vec![(0, 1)]).unwrap();
        let degrees = star.degrees(DegreeMode::Count).unwrap();
        let weights = LineGraphWeighter::new(5.0).modified_edge_weights(&star, &degrees).unwrap();
        assert!((weights[&EdgeKey::new(0, 1)] - (2.0f64.ln() + 5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_path_leaf_degree_factor() {
        let graph = Graph::from_unweighted_edges(false, vec![(0, 1), (1, 2)]).unwrap();
        let weights = weigh(&graph);

        // both far endpoints are leaves and the weight factor is w / (2w - w)
        assert_eq!(weights.len(), 1);
        let w = weights.weight(&EdgeKey::new(1, 2), &EdgeKey::new(0, 1)).unwrap();
        assert!((w - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_denominator_is_recovered() {
        // (0, 1) and (2, 3) share nothing, so the pair resolves through node 1,
        // whose only edge is (0, 1)
        let graph = Graph::from_unweighted_edges(false, vec![(0, 1), (2, 3), (3, 4)]).unwrap();
        let line = LineGraph::from_pairs(&graph, vec![(EdgeKey::new(0, 1), EdgeKey::new(2, 3))]).unwrap();
        let weights = LineGraphWeighter::default().weigh(&graph, &line).unwrap();

        assert_eq!(weights.diagnostics().len(), 1);
        assert_eq!(weights.diagnostics()[0].common, 1);
        assert_eq!(weights.diagnostics()[0].source_edge, EdgeKey::new(0, 1));
        let w = weights.iter().next().unwrap().weight;
        assert!(w.is_finite() && w >= 0.0);
    }

    #[test]
    fn test_self_loop_pairs_join_at_loop_vertex() {
        let edges = vec![(2, 3), (3, 2), (2, 3), (0, 3), (2, 2), (0, 0), (3, 1), (2, 1)];
        let graph = Graph::from_unweighted_edges(false, edges.clone()).unwrap();
        let weights = weigh(&graph);

        let w = weights.weight(&EdgeKey::new(0, 3), &EdgeKey::new(0, 0)).unwrap();
        assert!(w.is_finite() && w > 0.0);
        for pair in weights.iter() {
            assert!(pair.weight >= 0.0, "{:?}", pair);
        }
        assert!(weights.diagnostics().is_empty());

        // flipping the stored orientation of (0, 3) leaves its weight alone
        let flipped: Vec<_> = edges
            .into_iter()
            .map(|(u, v)| if (u, v) == (0, 3) { (3, 0) } else { (u, v) })
            .collect();
        let graph = Graph::from_unweighted_edges(false, flipped).unwrap();
        let w_flipped = weigh(&graph)
            .weight(&EdgeKey::new(3, 0), &EdgeKey::new(0, 0))
            .unwrap();
        assert!((w - w_flipped).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let mut edges = Vec::new();
        for i in 0..30u64 {
            edges.push((i, (i + 1) % 30));
            edges.push((i, (i * 7 + 3) % 30));
        }
        let graph = Graph::from_unweighted_edges(false, edges).unwrap();
        let line = LineGraph::derive(&graph).unwrap();

        let sequential = LineGraphWeighter::default().weigh(&graph, &line).unwrap();
        let parallel = LineGraphWeighter::default()
            .with_parallel_threshold(0)
            .weigh(&graph, &line)
            .unwrap();

        assert_eq!(sequential.len(), parallel.len());
        for (a, b) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_write_edgelist_uses_dense_indices() {
        let graph = Graph::from_unweighted_edges(false, vec![(7, 8), (8, 9)]).unwrap();
        let weights = weigh(&graph);
        let index = EdgeIndexMap::from_graph(&graph);

        let mut out = Vec::new();
        weights.write_edgelist(&mut out, &index).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.trim(), "0 1 1");
    }

    /// Small multigraphs where roughly a third of the edges are self-loops
    fn loopy_edges() -> impl Strategy<Value = Vec<(u64, u64)>> {
        proptest::collection::vec(
            (0u64..6, 0u64..6, 0u8..3).prop_map(|(u, v, kind)| if kind == 0 { (u, u) } else { (u, v) }),
            2..24,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1024))]

        #[test]
        fn prop_weights_non_negative_and_finite(
            pairs in loopy_edges(),
            directed in any::<bool>(),
            weighted in any::<bool>(),
        ) {
            let graph = Graph::from_unweighted_edges(directed, pairs).unwrap();
            let line = LineGraph::derive(&graph).unwrap();
            let mode = if weighted { DegreeMode::Weighted } else { DegreeMode::Count };
            let weights = LineGraphWeighter::default()
                .with_degree_mode(mode)
                .weigh(&graph, &line)
                .unwrap();

            prop_assert_eq!(weights.len(), line.edge_count());
            for pair in weights.iter() {
                prop_assert!(pair.weight.is_finite());
                prop_assert!(pair.weight >= 0.0);
            }
        }
    }
}
