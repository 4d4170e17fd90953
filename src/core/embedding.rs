//! Edge embedding matrix

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{Line2VecError, Result};

/// E × D matrix whose row `i` embeds the edge with index `i`
///
/// The shape is fixed at construction; rows can be edited in place but the
/// matrix is never resized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    data: Array2<f64>,
}

impl EmbeddingMatrix {
    /// Wrap an existing array
    pub fn new(data: Array2<f64>) -> Self {
        EmbeddingMatrix { data }
    }

    /// All-zero matrix
    pub fn zeros(rows: usize, dim: usize) -> Self {
        EmbeddingMatrix {
            data: Array2::zeros((rows, dim)),
        }
    }

    /// Build from row vectors, which must all have the same length
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let dim = rows.first().map_or(0, Vec::len);
        let mut data = Array2::zeros((rows.len(), dim));
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(Line2VecError::DimensionMismatch {
                    expected: dim,
                    found: row.len(),
                });
            }
            for (j, &value) in row.iter().enumerate() {
                data[[i, j]] = value;
            }
        }
        Ok(EmbeddingMatrix { data })
    }

    /// Deterministic small random initialisation, `(U[0, 1) - 0.5) / dim`
    ///
    /// Matches the scale skip-gram trainers use for fresh vectors.
    pub fn seeded(rows: usize, dim: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let scale = dim.max(1) as f64;
        let data = Array2::from_shape_fn((rows, dim), |_| (rng.gen::<f64>() - 0.5) / scale);
        EmbeddingMatrix { data }
    }

    /// Number of rows (edges)
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Embedding dimensionality
    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, dim)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Row of one edge
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.row(index)
    }

    /// Mutable row of one edge
    pub fn row_mut(&mut self, index: usize) -> ArrayViewMut1<'_, f64> {
        self.data.row_mut(index)
    }

    /// Whole matrix, read-only
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Whole matrix, writable in place
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.data.view_mut()
    }

    /// First row holding a NaN or infinite value
    pub fn first_non_finite_row(&self) -> Option<usize> {
        self.data
            .outer_iter()
            .position(|row| row.iter().any(|v| !v.is_finite()))
    }

    /// Fail unless the matrix is `rows × dim`
    pub(crate) fn check_shape(&self, rows: usize, dim: usize) -> Result<()> {
        if self.rows() != rows {
            return Err(Line2VecError::DimensionMismatch {
                expected: rows,
                found: self.rows(),
            });
        }
        if self.dim() != dim {
            return Err(Line2VecError::DimensionMismatch {
                expected: dim,
                found: self.dim(),
            });
        }
        Ok(())
    }

    /// Unwrap the underlying array
    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let m = EmbeddingMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.row(1)[0], 3.0);

        let ragged = EmbeddingMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(ragged.is_err());
    }

    #[test]
    fn test_seeded_is_deterministic_and_small() {
        let a = EmbeddingMatrix::seeded(5, 8, 7);
        let b = EmbeddingMatrix::seeded(5, 8, 7);
        assert_eq!(a, b);
        assert!(a.view().iter().all(|v| v.abs() <= 0.5 / 8.0));
        assert_ne!(a, EmbeddingMatrix::seeded(5, 8, 8));
    }

    #[test]
    fn test_non_finite_detection() {
        let mut m = EmbeddingMatrix::zeros(3, 2);
        assert_eq!(m.first_non_finite_row(), None);
        m.row_mut(2)[1] = f64::NAN;
        assert_eq!(m.first_non_finite_row(), Some(2));
    }
}
