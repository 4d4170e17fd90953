//! Structural line graph: edges become nodes

use std::collections::BTreeSet;

use crate::graph::{EdgeKey, Graph};
use crate::{Line2VecError, Result};

/// Line graph of a [`Graph`]
///
/// Line-graph nodes are the original edges (by insertion ordinal) and each
/// line-graph edge is stored once as an ordered pair of ordinals.
#[derive(Clone, Debug, PartialEq)]
pub struct LineGraph {
    edges: Vec<EdgeKey>,
    pairs: Vec<(usize, usize)>,
}

impl LineGraph {
    /// Derive the line graph of `graph`
    ///
    /// Undirected: every two distinct edges sharing an endpoint are joined.
    /// Directed: `(u, v)` is joined to every other edge leaving `v`.
    pub fn derive(graph: &Graph) -> Result<Self> {
        let mut pairs = BTreeSet::new();

        if graph.is_directed() {
            for (ordinal, key) in graph.edge_keys().iter().enumerate() {
                let onward = graph.outgoing_ordinals(key.target)?;
                for next in onward.into_iter().filter(|&next| next != ordinal) {
                    pairs.insert((ordinal, next));
                }
            }
        } else {
            for node in graph.nodes() {
                let incident = graph.incident_ordinals(node)?;
                for (i, &a) in incident.iter().enumerate() {
                    for &b in &incident[i + 1..] {
                        pairs.insert((a, b));
                    }
                }
            }
        }

        Ok(LineGraph {
            edges: graph.edge_keys().to_vec(),
            pairs: pairs.into_iter().collect(),
        })
    }

    /// Wrap an externally derived line graph over the edges of `graph`
    pub fn from_pairs<I>(graph: &Graph, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (EdgeKey, EdgeKey)>,
    {
        let ordinal = |key: &EdgeKey| {
            graph.edge_ordinal(key).ok_or(Line2VecError::InconsistentIndex {
                u: key.source,
                v: key.target,
                key: key.key,
            })
        };

        let pairs = pairs
            .into_iter()
            .map(|(a, b)| Ok((ordinal(&a)?, ordinal(&b)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(LineGraph {
            edges: graph.edge_keys().to_vec(),
            pairs,
        })
    }

    /// Number of line-graph nodes (original edges)
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of line-graph edges
    pub fn edge_count(&self) -> usize {
        self.pairs.len()
    }

    /// Original edges, by ordinal
    pub fn nodes(&self) -> &[EdgeKey] {
        &self.edges
    }

    /// Line-graph edges as ordinal pairs
    pub fn ordinal_pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Line-graph edges as pairs of original edges
    pub fn pairs(&self) -> impl Iterator<Item = (EdgeKey, EdgeKey)> + '_ {
        self.pairs
            .iter()
            .map(move |&(a, b)| (self.edges[a], self.edges[b]))
    }
}
