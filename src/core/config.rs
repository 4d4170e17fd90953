//! Hyperparameters for a Line2Vec run

use serde::{Deserialize, Serialize};

use super::optimizer::DEFAULT_MAX_BACKTRACKS;
use crate::graph::DegreeMode;
use crate::line_graph::DEFAULT_EPSILON;
use crate::{Line2VecError, Result};

/// How the penalty weight β evolves between outer iterations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BetaSchedule {
    /// Keep β fixed
    Constant,
    /// Multiply β by `factor` after every outer iteration
    Geometric {
        /// Growth factor, must be positive
        factor: f64,
    },
}

impl BetaSchedule {
    /// β for the next outer iteration
    pub fn next(&self, beta: f64) -> f64 {
        match self {
            BetaSchedule::Constant => beta,
            BetaSchedule::Geometric { factor } => beta * factor,
        }
    }
}

impl Default for BetaSchedule {
    fn default() -> Self {
        BetaSchedule::Geometric { factor: 2.0 }
    }
}

/// Line2Vec configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line2VecConfig {
    /// Embedding dimensionality D
    pub dimensions: usize,
    /// Initial penalty weight β
    pub beta: f64,
    /// Evolution of β across outer iterations
    pub beta_schedule: BetaSchedule,
    /// Step size η, held constant
    pub eta: f64,
    /// Number of optimize-then-retrain rounds
    pub outer_iterations: usize,
    /// Floor for modified edge weights
    pub epsilon: f64,
    /// Degree definition used by the line-graph weights
    pub degree_mode: DegreeMode,
    /// Step halvings allowed per row or ball
    pub max_backtracks: usize,
    /// Run one more ball projection after the last retraining
    pub final_projection: bool,
}

impl Line2VecConfig {
    /// Config with `dimensions`, everything else default
    pub fn with_dimensions(dimensions: usize) -> Self {
        Line2VecConfig {
            dimensions,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(invalid("Embedding dimension must be positive"));
        }

        if !(self.beta > 0.0 && self.beta.is_finite()) {
            return Err(invalid("Penalty weight beta must be positive and finite"));
        }

        if !(self.eta > 0.0 && self.eta.is_finite()) {
            return Err(invalid("Step size eta must be positive and finite"));
        }

        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(invalid("Epsilon must be positive and finite"));
        }

        if let BetaSchedule::Geometric { factor } = self.beta_schedule {
            if !(factor > 0.0 && factor.is_finite()) {
                return Err(invalid("Beta growth factor must be positive and finite"));
            }
        }

        Ok(())
    }
}

fn invalid(message: &str) -> Line2VecError {
    Line2VecError::InvalidConfig(message.to_string())
}

impl Default for Line2VecConfig {
    fn default() -> Self {
        Line2VecConfig {
            dimensions: 128,
            beta: 0.01,
            beta_schedule: BetaSchedule::default(),
            eta: 0.001,
            outer_iterations: 1,
            epsilon: DEFAULT_EPSILON,
            degree_mode: DegreeMode::Count,
            max_backtracks: DEFAULT_MAX_BACKTRACKS,
            final_projection: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = Line2VecConfig::default();
        assert!(config.validate().is_ok());

        config.dimensions = 0;
        assert!(config.validate().is_err());

        config.dimensions = 16;
        config.eta = -0.001;
        assert!(config.validate().is_err());

        config.eta = 0.001;
        config.beta = f64::NAN;
        assert!(config.validate().is_err());

        config.beta = 0.01;
        config.beta_schedule = BetaSchedule::Geometric { factor: 0.0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_beta_schedule() {
        assert_eq!(BetaSchedule::default().next(0.01), 0.02);
        assert_eq!(BetaSchedule::Constant.next(0.5), 0.5);
        assert_eq!(BetaSchedule::Geometric { factor: 3.0 }.next(1.0), 3.0);
    }

    #[test]
    fn test_config_json() {
        let config = Line2VecConfig::with_dimensions(32);
        let json = serde_json::to_string(&config).unwrap();
        let back: Line2VecConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.dimensions, 32);
        assert_eq!(back.outer_iterations, 1);
    }
}
