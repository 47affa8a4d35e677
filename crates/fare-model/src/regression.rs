//! Ordinary least squares with intercept.

use crate::error::{ModelError, Result};
use crate::linalg::solve_symmetric_min_norm;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Fitted linear model `y = x . coefficients + intercept`.
///
/// Fitting centres `x` and `y`, then solves the normal equations of the
/// centred design for the minimum-norm coefficients. The intercept is
/// recovered from the column means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Slope per input column
    pub coefficients: Array1<f64>,
    /// Constant term
    pub intercept: f64,
}

impl LinearRegression {
    /// Fit on `x` (rows x features) against `y`.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        let n_rows = x.nrows();
        if n_rows == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if y.len() != n_rows {
            return Err(ModelError::DimensionMismatch {
                expected: n_rows,
                actual: y.len(),
            });
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let y_mean = y.mean().unwrap_or(0.0);

        let xc = x - &x_mean;
        let yc = y - y_mean;

        let gram = xc.t().dot(&xc);
        let rhs = xc.t().dot(&yc);
        let coefficients = solve_symmetric_min_norm(&gram, &rhs)?;
        let intercept = y_mean - x_mean.dot(&coefficients);

        Ok(Self {
            coefficients,
            intercept,
        })
    }

    /// Number of input columns.
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Predict one value per row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                actual: x.ncols(),
            });
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }
}
