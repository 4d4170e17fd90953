//! Penalty error: squared out-of-ball distance summed over edges
//!
//! For an edge row `x` with endpoints `u` and `v` the error contributes
//! `max(0, |x - c_u|² - r_u²) + max(0, |x - c_v|² - r_v²)`.

use ndarray::ArrayView1;

use super::{EmbeddingMatrix, SphereSet};
use crate::graph::Incidence;
use crate::{Line2VecError, Result};

pub(crate) fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// `max(0, |x - c|² - r²)`
pub fn violation(x: ArrayView1<'_, f64>, center: ArrayView1<'_, f64>, radius: f64) -> f64 {
    (squared_distance(x, center) - radius * radius).max(0.0)
}

fn check_alignment(embeddings: &EmbeddingMatrix, spheres: &SphereSet, incidence: &Incidence) -> Result<()> {
    embeddings.check_shape(incidence.row_count(), spheres.dim())?;
    if spheres.len() != incidence.node_count() {
        return Err(Line2VecError::DimensionMismatch {
            expected: incidence.node_count(),
            found: spheres.len(),
        });
    }
    Ok(())
}

/// Total penalty error of a configuration
///
/// Pure: nothing is modified. Fails if the matrix, balls and incidence
/// tables disagree in shape.
pub fn measure_penalty_error(
    embeddings: &EmbeddingMatrix,
    spheres: &SphereSet,
    incidence: &Incidence,
) -> Result<f64> {
    check_alignment(embeddings, spheres, incidence)?;

    let error = (0..embeddings.rows())
        .map(|row| {
            let (u, v) = incidence.row_endpoints(row);
            let x = embeddings.row(row);
            violation(x, spheres.center(u), spheres.radius(u))
                + violation(x, spheres.center(v), spheres.radius(v))
        })
        .sum();
    Ok(error)
}

/// Penalty terms charged to one node's ball
pub fn node_penalty_error(
    embeddings: &EmbeddingMatrix,
    spheres: &SphereSet,
    incidence: &Incidence,
    pos: usize,
) -> Result<f64> {
    check_alignment(embeddings, spheres, incidence)?;

    let center = spheres.center(pos);
    let radius = spheres.radius(pos);
    Ok(incidence
        .incident_rows(pos)
        .iter()
        .map(|&row| incidence.multiplicity(row, pos) * violation(embeddings.row(row), center, radius))
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeIndexMap, Graph};
    use ndarray::array;

    fn path() -> (Incidence, EmbeddingMatrix) {
        let graph = Graph::from_unweighted_edges(false, vec![(0, 1), (1, 2)]).unwrap();
        let index = EdgeIndexMap::from_graph(&graph);
        let incidence = Incidence::build(&graph, &index).unwrap();
        let embeddings = EmbeddingMatrix::new(array![[0.0, 0.0], [10.0, 10.0]]);
        (incidence, embeddings)
    }

    #[test]
    fn test_initial_path_error_is_zero() {
        let (incidence, embeddings) = path();
        let spheres = SphereSet::initialize(&embeddings, &incidence).unwrap();

        // both rows sit on the middle ball's boundary
        let error = measure_penalty_error(&embeddings, &spheres, &incidence).unwrap();
        assert!(error.abs() < 1e-9);
    }

    #[test]
    fn test_closed_form_error() {
        let (incidence, embeddings) = path();
        let mut spheres = SphereSet::initialize(&embeddings, &incidence).unwrap();
        let middle = incidence.position(1).unwrap();
        spheres.set_radius(middle, 5.0);

        // each row is sqrt(50) from (5, 5): 2 * (50 - 25)
        let error = measure_penalty_error(&embeddings, &spheres, &incidence).unwrap();
        assert!((error - 50.0).abs() < 1e-9);
        let node = node_penalty_error(&embeddings, &spheres, &incidence, middle).unwrap();
        assert!((node - error).abs() < 1e-12);
    }

    #[test]
    fn test_oracle_is_pure() {
        let (incidence, embeddings) = path();
        let spheres = SphereSet::initialize(&embeddings, &incidence).unwrap();
        let (e0, s0) = (embeddings.clone(), spheres.clone());

        measure_penalty_error(&embeddings, &spheres, &incidence).unwrap();
        assert_eq!(embeddings, e0);
        assert_eq!(spheres, s0);
    }

    #[test]
    fn test_misaligned_inputs_rejected() {
        let (incidence, _) = path();
        let embeddings = EmbeddingMatrix::zeros(2, 3);
        let spheres = SphereSet::new(ndarray::Array2::zeros((3, 2)), array![1.0, 1.0, 1.0]).unwrap();

        assert!(measure_penalty_error(&embeddings, &spheres, &incidence).is_err());
    }

    #[test]
    fn test_violation_only_counts_outside() {
        let x = array![3.0, 4.0];
        let c = array![0.0, 0.0];
        assert_eq!(violation(x.view(), c.view(), 5.0), 0.0);
        assert_eq!(violation(x.view(), c.view(), 6.0), 0.0);
        assert!((violation(x.view(), c.view(), 4.0) - 9.0).abs() < 1e-12);
    }
}
