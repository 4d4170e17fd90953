//! Per-node enclosing balls and their initialisation

use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};

use super::penalty::squared_distance;
use super::EmbeddingMatrix;
use crate::graph::Incidence;
use crate::{Line2VecError, Result};

/// One `(center, radius)` ball per node, indexed by node position
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphereSet {
    centers: Array2<f64>,
    radii: Array1<f64>,
}

impl SphereSet {
    /// Assemble from explicit centres (one row per node) and radii
    pub fn new(centers: Array2<f64>, radii: Array1<f64>) -> Result<Self> {
        if centers.nrows() != radii.len() {
            return Err(Line2VecError::DimensionMismatch {
                expected: centers.nrows(),
                found: radii.len(),
            });
        }
        if let Some(r) = radii.iter().find(|r| !(**r >= 0.0)) {
            return Err(Line2VecError::InvalidConfig(format!(
                "radius must be non-negative, got {}",
                r
            )));
        }
        Ok(SphereSet { centers, radii })
    }

    /// Bootstrap balls from an initial embedding
    ///
    /// The centre of a node is the mean of its incident edge rows; its radius
    /// is the largest distance from that centre to a neighbour's centre.
    /// Every node must have at least one neighbour.
    pub fn initialize(embeddings: &EmbeddingMatrix, incidence: &Incidence) -> Result<Self> {
        embeddings.check_shape(incidence.row_count(), embeddings.dim())?;

        let n = incidence.node_count();
        let dim = embeddings.dim();
        let mut centers = Array2::zeros((n, dim));

        for pos in 0..n {
            if incidence.neighbors(pos).is_empty() {
                return Err(Line2VecError::DegenerateGraph {
                    node: incidence.node_at(pos),
                });
            }
            let rows = incidence.incident_rows(pos);
            let mut center = centers.row_mut(pos);
            for &row in rows {
                center += &embeddings.row(row);
            }
            center /= rows.len() as f64;
        }

        let radii = Array1::from_shape_fn(n, |pos| {
            incidence
                .neighbors(pos)
                .iter()
                .map(|&other| squared_distance(centers.row(pos), centers.row(other)).sqrt())
                .fold(0.0, f64::max)
        });

        let spheres = SphereSet { centers, radii };
        if let Some(pos) = spheres.first_non_finite() {
            return Err(Line2VecError::NonFiniteSphere {
                node: incidence.node_at(pos),
            });
        }
        Ok(spheres)
    }

    /// Number of balls
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    /// Whether there are no balls
    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Dimensionality of the centres
    pub fn dim(&self) -> usize {
        self.centers.ncols()
    }

    /// Centre of the node at `pos`
    pub fn center(&self, pos: usize) -> ArrayView1<'_, f64> {
        self.centers.row(pos)
    }

    pub(crate) fn center_mut(&mut self, pos: usize) -> ArrayViewMut1<'_, f64> {
        self.centers.row_mut(pos)
    }

    /// Radius of the node at `pos`
    pub fn radius(&self, pos: usize) -> f64 {
        self.radii[pos]
    }

    /// Overwrite a radius; negative values are clamped to zero
    pub fn set_radius(&mut self, pos: usize, radius: f64) {
        self.radii[pos] = radius.max(0.0);
    }

    /// Overwrite a centre
    pub fn set_center(&mut self, pos: usize, center: ArrayView1<'_, f64>) -> Result<()> {
        if center.len() != self.dim() {
            return Err(Line2VecError::DimensionMismatch {
                expected: self.dim(),
                found: center.len(),
            });
        }
        self.centers.row_mut(pos).assign(&center);
        Ok(())
    }

    /// All centres, one row per node
    pub fn centers(&self) -> &Array2<f64> {
        &self.centers
    }

    /// All radii
    pub fn radii(&self) -> &Array1<f64> {
        &self.radii
    }

    /// First node position whose ball holds a NaN or infinite value
    pub fn first_non_finite(&self) -> Option<usize> {
        (0..self.len()).find(|&pos| {
            !self.radii[pos].is_finite() || self.centers.row(pos).iter().any(|v| !v.is_finite())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeIndexMap, Graph};
    use ndarray::array;

    fn path_incidence() -> Incidence {
        let graph = Graph::from_unweighted_edges(false, vec![(0, 1), (1, 2)]).unwrap();
        let index = EdgeIndexMap::from_graph(&graph);
        Incidence::build(&graph, &index).unwrap()
    }

    #[test]
    fn test_path_spheres() {
        let incidence = path_incidence();
        let embeddings = EmbeddingMatrix::new(array![[0.0, 0.0], [10.0, 10.0]]);
        let spheres = SphereSet::initialize(&embeddings, &incidence).unwrap();

        let middle = incidence.position(1).unwrap();
        assert_eq!(spheres.center(middle), array![5.0, 5.0]);
        assert_eq!(spheres.center(incidence.position(0).unwrap()), array![0.0, 0.0]);
        assert_eq!(spheres.center(incidence.position(2).unwrap()), array![10.0, 10.0]);

        let expected = 50.0f64.sqrt();
        for pos in 0..3 {
            assert!((spheres.radius(pos) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_isolated_node_rejected() {
        let mut graph = Graph::from_unweighted_edges(false, vec![(0, 1)]).unwrap();
        graph.add_node(9);
        let index = EdgeIndexMap::from_graph(&graph);
        let incidence = Incidence::build(&graph, &index).unwrap();
        let embeddings = EmbeddingMatrix::zeros(1, 3);

        assert!(matches!(
            SphereSet::initialize(&embeddings, &incidence),
            Err(Line2VecError::DegenerateGraph { node: 9 })
        ));
    }

    #[test]
    fn test_row_count_must_match() {
        let incidence = path_incidence();
        let embeddings = EmbeddingMatrix::zeros(3, 2);
        assert!(matches!(
            SphereSet::initialize(&embeddings, &incidence),
            Err(Line2VecError::DimensionMismatch { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn test_new_rejects_negative_radius() {
        let centers = Array2::zeros((2, 2));
        assert!(SphereSet::new(centers.clone(), array![1.0, -0.5]).is_err());
        assert!(SphereSet::new(centers, array![1.0]).is_err());
    }

    #[test]
    fn test_set_radius_clamps() {
        let mut spheres = SphereSet::new(Array2::zeros((1, 2)), array![1.0]).unwrap();
        spheres.set_radius(0, -3.0);
        assert_eq!(spheres.radius(0), 0.0);
    }
}
