//! Node neighbourhoods and node/edge-row incidence

use std::collections::HashMap;

use super::{EdgeIndexMap, Graph, NodeId};
use crate::{Line2VecError, Result};

/// Read-only neighbourhood tables aligned with an [`EdgeIndexMap`]
///
/// Nodes are addressed by their dense position (graph insertion order),
/// which is also the row of the node's sphere. Edge rows are the indices of
/// the edge index map, so every lookup the optimizer performs was resolved
/// once at build time.
#[derive(Clone, Debug)]
pub struct Incidence {
    nodes: Vec<NodeId>,
    positions: HashMap<NodeId, usize>,
    neighbors: Vec<Vec<usize>>,
    incident_rows: Vec<Vec<usize>>,
    row_endpoints: Vec<(usize, usize)>,
}

impl Incidence {
    /// Resolve neighbourhoods of `graph` against `index`
    ///
    /// Fails with `InconsistentIndex` if an edge of the graph has no row of
    /// its own (directed graphs match orientation exactly), or
    /// `DimensionMismatch` if the sizes differ.
    pub fn build(graph: &Graph, index: &EdgeIndexMap) -> Result<Self> {
        let rows_by_ordinal = index.assign_rows(graph)?;

        let nodes: Vec<NodeId> = graph.nodes().collect();
        let positions: HashMap<NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(pos, &node)| (node, pos))
            .collect();
        let position = |node: NodeId| {
            positions
                .get(&node)
                .copied()
                .ok_or(Line2VecError::UnknownNode(node))
        };

        let mut neighbors = Vec::with_capacity(nodes.len());
        let mut incident_rows = Vec::with_capacity(nodes.len());
        for &node in &nodes {
            let adjacent = graph
                .neighbors(node)?
                .into_iter()
                .map(position)
                .collect::<Result<Vec<_>>>()?;
            neighbors.push(adjacent);

            let mut rows: Vec<usize> = graph
                .incident_ordinals(node)?
                .into_iter()
                .map(|ordinal| rows_by_ordinal[ordinal])
                .collect();
            rows.sort_unstable();
            incident_rows.push(rows);
        }

        let row_endpoints = index
            .edges()
            .iter()
            .map(|key| Ok((position(key.source)?, position(key.target)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Incidence {
            nodes,
            positions,
            neighbors,
            incident_rows,
            row_endpoints,
        })
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edge rows
    pub fn row_count(&self) -> usize {
        self.row_endpoints.len()
    }

    /// Node ids by position
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Node id at a position
    pub fn node_at(&self, pos: usize) -> NodeId {
        self.nodes[pos]
    }

    /// Position of a node id
    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.positions.get(&node).copied()
    }

    /// Neighbour positions of the node at `pos`
    pub fn neighbors(&self, pos: usize) -> &[usize] {
        &self.neighbors[pos]
    }

    /// Embedding rows of edges touching the node at `pos`
    pub fn incident_rows(&self, pos: usize) -> &[usize] {
        &self.incident_rows[pos]
    }

    /// Node positions of both endpoints of an edge row
    pub fn row_endpoints(&self, row: usize) -> (usize, usize) {
        self.row_endpoints[row]
    }

    /// How many endpoints of `row` are the node at `pos` (2 for a self-loop)
    pub fn multiplicity(&self, row: usize, pos: usize) -> f64 {
        let (u, v) = self.row_endpoints[row];
        (u == pos) as u8 as f64 + (v == pos) as u8 as f64
    }
}
