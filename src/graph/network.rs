//! Weighted multigraph backed by petgraph

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::{Line2VecError, Result};

/// Opaque node identifier, stable for the lifetime of a graph
pub type NodeId = u64;

/// Identity of one edge of the original graph
///
/// `key` distinguishes parallel edges between the same endpoints: the first
/// edge between two nodes gets key 0, the next key 1, and so on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    /// First endpoint (tail for directed graphs)
    pub source: NodeId,
    /// Second endpoint (head for directed graphs)
    pub target: NodeId,
    /// Parallel-edge ordinal
    pub key: u32,
}

impl EdgeKey {
    /// Create the key of the first edge between two nodes
    pub fn new(source: NodeId, target: NodeId) -> Self {
        EdgeKey { source, target, key: 0 }
    }

    /// Create a key with an explicit parallel-edge ordinal
    pub fn with_key(source: NodeId, target: NodeId, key: u32) -> Self {
        EdgeKey { source, target, key }
    }

    /// Same edge with the endpoints swapped
    pub fn reversed(&self) -> Self {
        EdgeKey {
            source: self.target,
            target: self.source,
            key: self.key,
        }
    }

    /// Orientation-free form with the smaller endpoint first
    pub fn canonical(&self) -> Self {
        if self.source <= self.target {
            *self
        } else {
            self.reversed()
        }
    }

    /// Both endpoints as a tuple
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.source, self.target)
    }

    /// Whether both endpoints coincide
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Whether `node` is one of the endpoints
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

/// How node degrees are measured
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegreeMode {
    /// Number of incident edge endpoints (a self-loop counts twice)
    #[default]
    Count,
    /// Sum of incident edge weights, counted the same way
    Weighted,
}

/// Directed or undirected weighted multigraph
///
/// Nodes keep their insertion order and edges are numbered densely in
/// insertion order. Undirected graphs are stored as directed edges and
/// traversed in both directions.
#[derive(Clone, Debug)]
pub struct Graph {
    inner: petgraph::Graph<NodeId, f64>,
    directed: bool,
    index: HashMap<NodeId, NodeIndex>,
    edge_keys: Vec<EdgeKey>,
    edge_lookup: HashMap<EdgeKey, EdgeIndex>,
}

impl Graph {
    /// Create an empty graph
    pub fn new(directed: bool) -> Self {
        Graph {
            inner: petgraph::Graph::new(),
            directed,
            index: HashMap::new(),
            edge_keys: Vec::new(),
            edge_lookup: HashMap::new(),
        }
    }

    /// Create an empty undirected graph
    pub fn undirected() -> Self {
        Self::new(false)
    }

    /// Create an empty directed graph
    pub fn directed() -> Self {
        Self::new(true)
    }

    /// Build a graph from weighted `(u, v, w)` triples
    pub fn from_edges<I>(directed: bool, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NodeId, NodeId, f64)>,
    {
        let mut graph = Self::new(directed);
        for (u, v, w) in edges {
            graph.add_edge(u, v, w)?;
        }
        Ok(graph)
    }

    /// Build a graph from `(u, v)` pairs, every edge weighing 1
    pub fn from_unweighted_edges<I>(directed: bool, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        Self::from_edges(directed, edges.into_iter().map(|(u, v)| (u, v, 1.0)))
    }

    /// Add a node if it is not present yet
    pub fn add_node(&mut self, node: NodeId) {
        self.ensure_node(node);
    }

    fn ensure_node(&mut self, node: NodeId) -> NodeIndex {
        if let Some(&ix) = self.index.get(&node) {
            return ix;
        }
        let ix = self.inner.add_node(node);
        self.index.insert(node, ix);
        ix
    }

    /// Add an edge and return its key
    ///
    /// Weights must be finite and non-negative.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, weight: f64) -> Result<EdgeKey> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Line2VecError::InvalidWeight { u, v, weight });
        }

        let a = self.ensure_node(u);
        let b = self.ensure_node(v);

        let mut parallel = self.inner.edges_connecting(a, b).count();
        if !self.directed && a != b {
            parallel += self.inner.edges_connecting(b, a).count();
        }

        let key = EdgeKey::with_key(u, v, parallel as u32);
        let edge = self.inner.add_edge(a, b, weight);
        debug_assert_eq!(edge.index(), self.edge_keys.len());
        self.edge_keys.push(key);
        self.edge_lookup.insert(key, edge);
        Ok(key)
    }

    /// Whether edges are oriented
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Whether the node exists
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.index.contains_key(&node)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inner.node_indices().map(move |ix| self.inner[ix])
    }

    /// Edges with their weights, in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, f64)> + '_ {
        self.inner
            .edge_indices()
            .map(move |e| (self.edge_keys[e.index()], self.inner[e]))
    }

    /// Edge keys in insertion order
    pub fn edge_keys(&self) -> &[EdgeKey] {
        &self.edge_keys
    }

    /// Position of an edge in insertion order
    ///
    /// Undirected graphs also match the key with its endpoints swapped.
    pub fn edge_ordinal(&self, key: &EdgeKey) -> Option<usize> {
        self.edge_lookup
            .get(key)
            .or_else(|| {
                if self.directed {
                    None
                } else {
                    self.edge_lookup.get(&key.reversed())
                }
            })
            .map(|e| e.index())
    }

    /// Weight of an edge
    pub fn edge_weight(&self, key: &EdgeKey) -> Option<f64> {
        self.edge_ordinal(key)
            .map(|ordinal| self.inner[EdgeIndex::new(ordinal)])
    }

    fn node_index(&self, node: NodeId) -> Result<NodeIndex> {
        self.index
            .get(&node)
            .copied()
            .ok_or(Line2VecError::UnknownNode(node))
    }

    /// Adjacent nodes in either direction, without duplicates
    ///
    /// A node with a self-loop is its own neighbour.
    pub fn neighbors(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let ix = self.node_index(node)?;
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for other in self.inner.neighbors_undirected(ix) {
            let id = self.inner[other];
            if seen.insert(id) {
                result.push(id);
            }
        }
        Ok(result)
    }

    /// Ordinals of all edges touching `node`, ascending; self-loops appear once
    pub(crate) fn incident_ordinals(&self, node: NodeId) -> Result<Vec<usize>> {
        let ix = self.node_index(node)?;
        let mut ordinals: Vec<usize> = self
            .inner
            .edges_directed(ix, Direction::Outgoing)
            .chain(self.inner.edges_directed(ix, Direction::Incoming))
            .map(|e| e.id().index())
            .collect();
        ordinals.sort_unstable();
        ordinals.dedup();
        Ok(ordinals)
    }

    /// Ordinals of edges leaving `node`, ascending
    pub(crate) fn outgoing_ordinals(&self, node: NodeId) -> Result<Vec<usize>> {
        let ix = self.node_index(node)?;
        let mut ordinals: Vec<usize> = self
            .inner
            .edges_directed(ix, Direction::Outgoing)
            .map(|e| e.id().index())
            .collect();
        ordinals.sort_unstable();
        Ok(ordinals)
    }

    /// Keys of all edges touching `node`
    pub fn incident_edges(&self, node: NodeId) -> Result<Vec<EdgeKey>> {
        Ok(self
            .incident_ordinals(node)?
            .into_iter()
            .map(|ordinal| self.edge_keys[ordinal])
            .collect())
    }

    /// Degree of a node; a self-loop contributes both of its endpoints
    pub fn degree(&self, node: NodeId, mode: DegreeMode) -> Result<f64> {
        let ix = self.node_index(node)?;
        let degree = self
            .inner
            .edges_directed(ix, Direction::Outgoing)
            .chain(self.inner.edges_directed(ix, Direction::Incoming))
            .map(|e| match mode {
                DegreeMode::Count => 1.0,
                DegreeMode::Weighted => *e.weight(),
            })
            .sum();
        Ok(degree)
    }

    /// Degree of every node
    pub fn degrees(&self, mode: DegreeMode) -> Result<HashMap<NodeId, f64>> {
        self.nodes()
            .map(|node| Ok((node, self.degree(node, mode)?)))
            .collect()
    }

    /// Nodes without any incident edge
    pub fn isolated_nodes(&self) -> Vec<NodeId> {
        self.inner
            .node_indices()
            .filter(|&ix| self.inner.neighbors_undirected(ix).next().is_none())
            .map(|ix| self.inner[ix])
            .collect()
    }
}
