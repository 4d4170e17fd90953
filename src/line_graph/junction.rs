//! How two adjacent edges meet

use crate::graph::{EdgeKey, NodeId};

/// Meeting point of two line-graph endpoints `(first, second)`
///
/// `start` is the far endpoint of `first`, `end` the far endpoint of
/// `second` and `common` the vertex through which a walk passes from one
/// edge to the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Junction {
    /// The edges share exactly one endpoint and each has its own far end
    Shared {
        /// Far endpoint of the first edge
        start: NodeId,
        /// Shared endpoint
        common: NodeId,
        /// Far endpoint of the second edge
        end: NodeId,
    },
    /// Self-loops, parallel edges or unrelated edges
    ///
    /// With a single shared vertex (one edge a self-loop) that vertex is
    /// `common` and a self-loop's far end is `common` itself. Parallel or
    /// unrelated edges fall back to `first = (start, common)` and
    /// `second = (common, end)` in stored orientation.
    Degenerate {
        /// Far endpoint of the first edge
        start: NodeId,
        /// Joining vertex
        common: NodeId,
        /// Far endpoint of the second edge
        end: NodeId,
    },
}

impl Junction {
    /// Classify the meeting of two edges from their endpoint sets
    pub fn resolve(first: &EdgeKey, second: &EdgeKey) -> Self {
        let a = endpoint_set(first);
        let b = endpoint_set(second);
        let shared: Vec<NodeId> = a.iter().copied().filter(|n| b.contains(n)).collect();

        if let [common] = shared[..] {
            let start = a.iter().copied().find(|&n| n != common);
            let end = b.iter().copied().find(|&n| n != common);
            return match (start, end) {
                (Some(start), Some(end)) => Junction::Shared { start, common, end },
                _ => Junction::Degenerate {
                    start: start.unwrap_or(common),
                    common,
                    end: end.unwrap_or(common),
                },
            };
        }

        Junction::Degenerate {
            start: first.source,
            common: first.target,
            end: second.target,
        }
    }

    /// Far endpoint of the first edge
    pub fn start(&self) -> NodeId {
        match *self {
            Junction::Shared { start, .. } | Junction::Degenerate { start, .. } => start,
        }
    }

    /// Vertex joining both edges
    pub fn common(&self) -> NodeId {
        match *self {
            Junction::Shared { common, .. } | Junction::Degenerate { common, .. } => common,
        }
    }

    /// Far endpoint of the second edge
    pub fn end(&self) -> NodeId {
        match *self {
            Junction::Shared { end, .. } | Junction::Degenerate { end, .. } => end,
        }
    }

    /// Whether the fallback ordering was used
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Junction::Degenerate { .. })
    }
}

fn endpoint_set(key: &EdgeKey) -> Vec<NodeId> {
    if key.is_self_loop() {
        vec![key.source]
    } else {
        vec![key.source, key.target]
    }
}
