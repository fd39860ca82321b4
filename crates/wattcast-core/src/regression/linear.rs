//! Ordinary least squares with intercept

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::{Error, Result};

use super::{check_shape, FittedModel, Regressor};

/// Ridge added to the diagonal of the column-scaled normal equations so
/// collinear or constant features still yield a finite solution
const RIDGE_EPSILON: f64 = 1e-10;

/// Linear regression solved through centred, column-scaled normal equations
#[derive(Debug, Clone, Default)]
pub struct LinearRegression;

impl LinearRegression {
    pub fn new() -> Self {
        Self
    }
}

/// Fitted linear model: `intercept + coefficients · x`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Array1<f64>,
}

impl FittedModel for LinearModel {
    fn predict(&self, features: ArrayView1<f64>) -> f64 {
        self.intercept + self.coefficients.dot(&features)
    }
}

impl Regressor for LinearRegression {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Box<dyn FittedModel>> {
        Ok(Box::new(fit_ols(x, y)?))
    }
}

/// Fit OLS, returning the concrete model
///
/// Each centred column is divided by its norm before the Gram matrix is
/// formed, so the ridge term is equally negligible for every feature no
/// matter its units.
pub fn fit_ols(x: &Array2<f64>, y: &Array1<f64>) -> Result<LinearModel> {
    let p = check_shape(x, y)?;

    let x_mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::Model("Cannot fit on an empty training set".into()))?;
    let y_mean = y.mean().unwrap_or(0.0);

    let x_centered = x - &x_mean.view().insert_axis(Axis(0));
    let y_centered = y - y_mean;

    // Constant columns keep a unit scale and end up with a zero coefficient
    let scale: Array1<f64> = x_centered
        .axis_iter(Axis(1))
        .map(|col| {
            let norm = col.dot(&col).sqrt();
            if norm > 0.0 {
                norm
            } else {
                1.0
            }
        })
        .collect();
    let x_scaled = &x_centered / &scale.view().insert_axis(Axis(0));

    let mut gram = x_scaled.t().dot(&x_scaled);
    for i in 0..p {
        gram[[i, i]] += RIDGE_EPSILON;
    }
    let moment = x_scaled.t().dot(&y_centered);

    let coefficients = cholesky_solve(&gram, &moment)? / &scale;
    let intercept = y_mean - coefficients.dot(&x_mean);

    if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
        return Err(Error::Model("Linear fit produced non-finite coefficients".into()));
    }

    Ok(LinearModel {
        intercept,
        coefficients,
    })
}

/// Solve `a · x = b` for symmetric positive definite `a`
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();

    // A = L · Lᵀ
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return Err(Error::Model("Normal equations are not positive definite".into()));
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L · z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| l[[i, k]] * z[k]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Lᵀ · x = z
    let mut solution = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|k| l[[k, i]] * solution[k]).sum();
        solution[i] = (z[i] - sum) / l[[i, i]];
    }
    Ok(solution)
}
