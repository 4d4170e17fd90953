//! Bijection between graph edges and embedding matrix rows

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{EdgeKey, Graph};
use crate::{Line2VecError, Result};

/// Dense index over the edges of a graph
///
/// Row `i` of an embedding matrix belongs to `edge_at(i)`. The map is built
/// once when the graph is loaded and never changes afterwards. It serializes
/// as the list of edges in index order; the forward table is rebuilt on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EdgeKey>", into = "Vec<EdgeKey>")]
pub struct EdgeIndexMap {
    forward: HashMap<EdgeKey, usize>,
    reverse: Vec<EdgeKey>,
}

impl EdgeIndexMap {
    /// Number edges in the graph's insertion order
    pub fn from_graph(graph: &Graph) -> Self {
        let reverse = graph.edge_keys().to_vec();
        let forward = reverse
            .iter()
            .enumerate()
            .map(|(index, key)| (*key, index))
            .collect();
        EdgeIndexMap { forward, reverse }
    }

    /// Build from edges listed in index order, rejecting duplicates
    pub fn from_edges(edges: Vec<EdgeKey>) -> Result<Self> {
        let mut forward = HashMap::with_capacity(edges.len());
        for (index, key) in edges.iter().enumerate() {
            if forward.insert(*key, index).is_some() {
                return Err(Line2VecError::InconsistentIndex {
                    u: key.source,
                    v: key.target,
                    key: key.key,
                });
            }
        }
        Ok(EdgeIndexMap {
            forward,
            reverse: edges,
        })
    }

    /// Number of indexed edges
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    /// Whether no edge is indexed
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Index of an edge with exactly this orientation
    pub fn index_of(&self, key: &EdgeKey) -> Option<usize> {
        self.forward.get(key).copied()
    }

    /// Index of an edge stored in either orientation
    pub fn index_of_either(&self, key: &EdgeKey) -> Option<usize> {
        self.index_of(key).or_else(|| self.index_of(&key.reversed()))
    }

    /// Like [`index_of_either`](Self::index_of_either), failing on a missing edge
    pub fn require(&self, key: &EdgeKey) -> Result<usize> {
        self.index_of_either(key)
            .ok_or(Line2VecError::InconsistentIndex {
                u: key.source,
                v: key.target,
                key: key.key,
            })
    }

    /// Edge stored at an index
    pub fn edge_at(&self, index: usize) -> Option<&EdgeKey> {
        self.reverse.get(index)
    }

    /// All edges in index order
    pub fn edges(&self) -> &[EdgeKey] {
        &self.reverse
    }

    /// `(index, edge)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &EdgeKey)> {
        self.reverse.iter().enumerate()
    }

    /// Row of a graph edge; orientation must match exactly when `graph` is directed
    pub fn row_of(&self, graph: &Graph, key: &EdgeKey) -> Result<usize> {
        let row = if graph.is_directed() {
            self.index_of(key)
        } else {
            self.index_of_either(key)
        };
        row.ok_or(Line2VecError::InconsistentIndex {
            u: key.source,
            v: key.target,
            key: key.key,
        })
    }

    /// Row of every edge of `graph`, by edge ordinal
    ///
    /// Fails unless the map is a bijection onto the graph's edges: sizes must
    /// agree and no two edges may claim the same row.
    pub fn assign_rows(&self, graph: &Graph) -> Result<Vec<usize>> {
        if self.len() != graph.edge_count() {
            return Err(Line2VecError::DimensionMismatch {
                expected: graph.edge_count(),
                found: self.len(),
            });
        }

        let mut claimed = vec![false; self.len()];
        graph
            .edge_keys()
            .iter()
            .map(|key| {
                let row = self.row_of(graph, key)?;
                if std::mem::replace(&mut claimed[row], true) {
                    return Err(Line2VecError::InconsistentIndex {
                        u: key.source,
                        v: key.target,
                        key: key.key,
                    });
                }
                Ok(row)
            })
            .collect()
    }

    /// Whether the map indexes exactly the edges of `graph`
    pub fn covers(&self, graph: &Graph) -> bool {
        self.assign_rows(graph).is_ok()
    }
}

impl TryFrom<Vec<EdgeKey>> for EdgeIndexMap {
    type Error = Line2VecError;

    fn try_from(edges: Vec<EdgeKey>) -> Result<Self> {
        Self::from_edges(edges)
    }
}

impl From<EdgeIndexMap> for Vec<EdgeKey> {
    fn from(map: EdgeIndexMap) -> Self {
        map.reverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lookup_both_orientations() {
        let graph = Graph::from_unweighted_edges(false, vec![(0, 1), (1, 2)]).unwrap();
        let map = EdgeIndexMap::from_graph(&graph);

        assert_eq!(map.index_of(&EdgeKey::new(1, 2)), Some(1));
        assert_eq!(map.index_of(&EdgeKey::new(2, 1)), None);
        assert_eq!(map.index_of_either(&EdgeKey::new(2, 1)), Some(1));
        assert!(matches!(
            map.require(&EdgeKey::new(0, 2)),
            Err(Line2VecError::InconsistentIndex { u: 0, v: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_edges_rejected() {
        let edges = vec![EdgeKey::new(0, 1), EdgeKey::new(0, 1)];
        assert!(EdgeIndexMap::from_edges(edges).is_err());
    }

    #[test]
    fn test_json_restores_forward_table() {
        let graph = Graph::from_unweighted_edges(false, vec![(3, 4), (4, 5), (5, 3)]).unwrap();
        let map = EdgeIndexMap::from_graph(&graph);

        let json = serde_json::to_string(&map).unwrap();
        let loaded: EdgeIndexMap = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded, map);
        assert_eq!(loaded.index_of(&EdgeKey::new(5, 3)), Some(2));
    }

    #[test]
    fn test_directed_index_must_match_orientation() {
        let graph = Graph::from_unweighted_edges(true, vec![(0, 1), (1, 0), (0, 0)]).unwrap();
        let map = EdgeIndexMap::from_edges(vec![
            EdgeKey::with_key(0, 1, 0),
            EdgeKey::with_key(0, 0, 0),
            EdgeKey::with_key(0, 0, 1),
        ])
        .unwrap();

        assert!(matches!(
            map.row_of(&graph, &EdgeKey::new(1, 0)),
            Err(Line2VecError::InconsistentIndex { u: 1, v: 0, .. })
        ));
        assert!(matches!(
            map.assign_rows(&graph),
            Err(Line2VecError::InconsistentIndex { u: 1, v: 0, .. })
        ));
        assert!(!map.covers(&graph));
    }

    #[test]
    fn test_undirected_index_accepts_either_orientation() {
        let graph = Graph::from_unweighted_edges(false, vec![(0, 1), (1, 0), (1, 2)]).unwrap();
        let map = EdgeIndexMap::from_edges(vec![
            EdgeKey::new(2, 1),
            EdgeKey::with_key(0, 1, 1),
            EdgeKey::new(1, 0),
        ])
        .unwrap();

        assert_eq!(map.assign_rows(&graph).unwrap(), vec![2, 1, 0]);
        assert!(map.covers(&graph));
    }

    #[test]
    fn test_size_mismatch_is_not_a_cover() {
        let graph = Graph::from_unweighted_edges(false, vec![(0, 1), (1, 2)]).unwrap();
        let map = EdgeIndexMap::from_edges(vec![EdgeKey::new(0, 1)]).unwrap();

        assert!(matches!(
            map.assign_rows(&graph),
            Err(Line2VecError::DimensionMismatch { expected: 2, found: 1 })
        ));
        assert!(!map.covers(&graph));
    }

    proptest! {
        #[test]
        fn prop_index_is_bijection(
            pairs in proptest::collection::vec((0u64..12, 0u64..12), 1..40),
            directed in any::<bool>(),
        ) {
            let graph = Graph::from_unweighted_edges(directed, pairs).unwrap();
            let map = EdgeIndexMap::from_graph(&graph);

            prop_assert_eq!(map.len(), graph.edge_count());
            prop_assert!(map.covers(&graph));
            for (key, _) in graph.edges() {
                let index = map.index_of(&key).unwrap();
                prop_assert!(index < map.len());
                prop_assert_eq!(map.edge_at(index), Some(&key));
            }
            for (index, key) in map.iter() {
                prop_assert_eq!(map.index_of(key), Some(index));
            }
        }
    }
}
