//! Ball-projection optimizer
//!
//! One outer iteration runs two phases in order:
//!
//! 1. **Embeddings** (balls fixed): every edge row outside one of its
//!    endpoint balls takes a penalty-gradient step of size `ηβ` toward the
//!    violated centres.
//! 2. **Balls** (rows fixed): every centre steps toward its violating rows
//!    (or toward the mean of its rows when none violate), then the radius
//!    grows by `ηβ` times the summed overshoot, or shrinks by a factor
//!    `1 - η` down to the farthest row when the ball already holds all rows.
//!
//! Both phases halve their step until the affected penalty terms do not
//! grow, and leave the row or ball untouched when no step qualifies. The
//! penalty decomposes per row in phase 1 and per node in phase 2, so the
//! total penalty error never increases across an iteration.

use ndarray::{Array1, ArrayView1};
use tracing::debug;

use super::penalty::{measure_penalty_error, squared_distance, violation};
use super::{EmbeddingMatrix, SphereSet};
use crate::graph::Incidence;
use crate::{Line2VecError, Result};

/// Default number of step halvings before a row or ball is left unchanged
pub const DEFAULT_MAX_BACKTRACKS: usize = 20;

/// Exclusive owner of the embedding matrix and balls during a run
pub struct BallOptimizer<'a> {
    embeddings: EmbeddingMatrix,
    spheres: SphereSet,
    incidence: &'a Incidence,
    eta: f64,
    max_backtracks: usize,
}

impl<'a> BallOptimizer<'a> {
    /// Take ownership of an embedding and its balls
    pub fn new(
        embeddings: EmbeddingMatrix,
        spheres: SphereSet,
        incidence: &'a Incidence,
        eta: f64,
    ) -> Result<Self> {
        if !(eta > 0.0 && eta.is_finite()) {
            return Err(Line2VecError::InvalidConfig(format!(
                "step size must be positive and finite, got {}",
                eta
            )));
        }
        let optimizer = BallOptimizer {
            embeddings,
            spheres,
            incidence,
            eta,
            max_backtracks: DEFAULT_MAX_BACKTRACKS,
        };
        optimizer.check_state()?;
        Ok(optimizer)
    }

    /// Set how often a step may be halved
    pub fn with_max_backtracks(mut self, max_backtracks: usize) -> Self {
        self.max_backtracks = max_backtracks;
        self
    }

    /// Run one outer iteration with penalty weight `beta`
    ///
    /// Returns the penalty error of the updated state.
    pub fn advance(&mut self, beta: f64) -> Result<f64> {
        if !(beta > 0.0 && beta.is_finite()) {
            return Err(Line2VecError::InvalidConfig(format!(
                "penalty weight must be positive and finite, got {}",
                beta
            )));
        }
        self.check_state()?;

        let moved_rows = self.update_embeddings(beta);
        self.check_embeddings()?;

        let moved_centers = self.update_spheres(beta);
        self.check_spheres()?;

        let error = self.penalty_error()?;
        debug!(beta, moved_rows, moved_centers, error, "ball projection step");
        Ok(error)
    }

    /// Penalty error of the current state
    pub fn penalty_error(&self) -> Result<f64> {
        measure_penalty_error(&self.embeddings, &self.spheres, self.incidence)
    }

    /// Current embeddings
    pub fn embeddings(&self) -> &EmbeddingMatrix {
        &self.embeddings
    }

    /// Lend the embeddings out, e.g. to an external trainer between iterations
    pub fn embeddings_mut(&mut self) -> &mut EmbeddingMatrix {
        &mut self.embeddings
    }

    /// Current balls
    pub fn spheres(&self) -> &SphereSet {
        &self.spheres
    }

    /// Step size η
    pub fn eta(&self) -> f64 {
        self.eta
    }

    /// Give back the embeddings and balls
    pub fn into_parts(self) -> (EmbeddingMatrix, SphereSet) {
        (self.embeddings, self.spheres)
    }

    fn check_state(&self) -> Result<()> {
        self.embeddings
            .check_shape(self.incidence.row_count(), self.spheres.dim())?;
        if self.spheres.len() != self.incidence.node_count() {
            return Err(Line2VecError::DimensionMismatch {
                expected: self.incidence.node_count(),
                found: self.spheres.len(),
            });
        }
        self.check_embeddings()?;
        self.check_spheres()
    }

    fn check_embeddings(&self) -> Result<()> {
        match self.embeddings.first_non_finite_row() {
            Some(row) => {
                let (u, v) = self.incidence.row_endpoints(row);
                Err(Line2VecError::NonFiniteEmbedding {
                    row,
                    u: self.incidence.node_at(u),
                    v: self.incidence.node_at(v),
                })
            }
            None => Ok(()),
        }
    }

    fn check_spheres(&self) -> Result<()> {
        match self.spheres.first_non_finite() {
            Some(pos) => Err(Line2VecError::NonFiniteSphere {
                node: self.incidence.node_at(pos),
            }),
            None => Ok(()),
        }
    }

    fn row_penalty(&self, x: ArrayView1<'_, f64>, u: usize, v: usize) -> f64 {
        violation(x, self.spheres.center(u), self.spheres.radius(u))
            + violation(x, self.spheres.center(v), self.spheres.radius(v))
    }

    fn node_penalty(&self, pos: usize, center: ArrayView1<'_, f64>, radius: f64) -> f64 {
        self.incidence
            .incident_rows(pos)
            .iter()
            .map(|&row| {
                self.incidence.multiplicity(row, pos)
                    * violation(self.embeddings.row(row), center, radius)
            })
            .sum()
    }

    /// Phase 1: pull violating rows toward their balls
    fn update_embeddings(&mut self, beta: f64) -> usize {
        let step = self.eta * beta;
        let mut moved = 0;

        for row in 0..self.embeddings.rows() {
            let (u, v) = self.incidence.row_endpoints(row);
            let x = self.embeddings.row(row).to_owned();
            let before = self.row_penalty(x.view(), u, v);
            if before <= 0.0 {
                continue;
            }

            let mut descent = Array1::zeros(x.len());
            for pos in [u, v] {
                let center = self.spheres.center(pos);
                if violation(x.view(), center, self.spheres.radius(pos)) > 0.0 {
                    descent -= &((&x - &center) * 2.0);
                }
            }

            let accepted = line_search(&x, &descent, step, self.max_backtracks, |candidate| {
                self.row_penalty(candidate, u, v) < before
            });
            if let Some(candidate) = accepted {
                self.embeddings.row_mut(row).assign(&candidate);
                moved += 1;
            }
        }

        moved
    }

    /// Phase 2: refit centres, then radii, against the updated rows
    fn update_spheres(&mut self, beta: f64) -> usize {
        let incidence = self.incidence;
        let mut moved = 0;

        for pos in 0..self.spheres.len() {
            let rows = incidence.incident_rows(pos);
            if rows.is_empty() {
                continue;
            }

            let center = self.spheres.center(pos).to_owned();
            let radius = self.spheres.radius(pos);
            let before = self.node_penalty(pos, center.view(), radius);

            let mut direction = Array1::zeros(center.len());
            let step = if before > 0.0 {
                for &row in rows {
                    let x = self.embeddings.row(row);
                    if violation(x, center.view(), radius) > 0.0 {
                        direction += &((&x - &center) * (2.0 * incidence.multiplicity(row, pos)));
                    }
                }
                self.eta * beta
            } else {
                for &row in rows {
                    direction += &(&self.embeddings.row(row) - &center);
                }
                direction /= rows.len() as f64;
                self.eta
            };

            let center = match line_search(&center, &direction, step, self.max_backtracks, |candidate| {
                self.node_penalty(pos, candidate, radius) <= before
            }) {
                Some(candidate) => {
                    if candidate != center {
                        moved += 1;
                    }
                    candidate
                }
                None => center,
            };

            let mut farthest: f64 = 0.0;
            let mut overshoot = 0.0;
            for &row in rows {
                let distance = squared_distance(self.embeddings.row(row), center.view()).sqrt();
                farthest = farthest.max(distance);
                if distance > radius {
                    overshoot += incidence.multiplicity(row, pos) * (distance - radius);
                }
            }
            let proposed = if overshoot > 0.0 {
                (radius + self.eta * beta * overshoot).min(farthest)
            } else {
                ((1.0 - self.eta) * radius).max(farthest)
            }
            .max(0.0);

            let radius = if proposed.is_finite()
                && self.node_penalty(pos, center.view(), proposed)
                    <= self.node_penalty(pos, center.view(), radius)
            {
                proposed
            } else {
                radius
            };

            self.spheres.center_mut(pos).assign(&center);
            self.spheres.set_radius(pos, radius);
        }

        moved
    }
}

/// Halve `step` along `direction` until `accept` holds for a finite point
fn line_search<F>(
    start: &Array1<f64>,
    direction: &Array1<f64>,
    step: f64,
    max_backtracks: usize,
    mut accept: F,
) -> Option<Array1<f64>>
where
    F: FnMut(ArrayView1<'_, f64>) -> bool,
{
    let mut step = step;
    for _ in 0..=max_backtracks {
        let candidate = start + &(direction * step);
        if candidate.iter().all(|v| v.is_finite()) && accept(candidate.view()) {
            return Some(candidate);
        }
        step *= 0.5;
    }
    None
}
