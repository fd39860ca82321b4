//! Pluggable regression models
//!
//! The trend pipeline only sees [`Regressor`] and [`FittedModel`], so the
//! linear and ensemble implementations are interchangeable.

pub mod forest;
pub mod linear;
pub mod metrics;

use std::fmt::Debug;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use forest::RandomForestRegressor;
pub use linear::LinearRegression;
pub use metrics::{r2_score, train_test_split};

/// A regression algorithm that can be fitted to a feature matrix
pub trait Regressor: Send + Sync {
    /// Short name for logs and API responses
    fn name(&self) -> &'static str;

    /// Fit to a `(samples, features)` matrix `x` and targets `y`
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Box<dyn FittedModel>>;
}

/// A fitted model mapping a feature row to a prediction
pub trait FittedModel: Send + Sync + Debug {
    fn predict(&self, features: ArrayView1<f64>) -> f64;
}

/// Validate the shape of a training set, returning the feature count
pub(crate) fn check_shape(x: &Array2<f64>, y: &Array1<f64>) -> Result<usize> {
    if x.nrows() == 0 {
        return Err(Error::Model("Cannot fit on an empty training set".into()));
    }
    if x.nrows() != y.len() {
        return Err(Error::Model(format!(
            "Feature rows ({}) and targets ({}) differ in length",
            x.nrows(),
            y.len()
        )));
    }
    Ok(x.ncols())
}

/// Regression algorithm selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressorKind {
    #[default]
    Linear,
    RandomForest,
}

impl RegressorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::RandomForest => "random_forest",
        }
    }

    /// Instantiate the regressor
    pub fn build(&self, trees: usize, seed: u64) -> Box<dyn Regressor> {
        match self {
            Self::Linear => Box::new(LinearRegression::new()),
            Self::RandomForest => Box::new(RandomForestRegressor::new(trees).with_seed(seed)),
        }
    }
}

impl FromStr for RegressorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" | "ols" => Ok(Self::Linear),
            "random_forest" | "forest" | "rf" => Ok(Self::RandomForest),
            _ => Err(format!("Unknown regressor: {}", s)),
        }
    }
}

impl std::fmt::Display for RegressorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
