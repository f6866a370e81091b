//! Ridge regression on centred features
//!
//! Solves `(XcᵀXc + αI) w = Xcᵀyc` where `Xc`, `yc` are the column-centred
//! design matrix and target. The intercept is recovered from the means and
//! is not penalised.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use shorecast_core::{Error, Result};

/// A fitted linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeModel {
    pub alpha: f64,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl RidgeModel {
    /// Fit on `x` (samples × features) and `y`.
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>, alpha: f64) -> Result<Self> {
        let (n, p) = x.dim();
        if n == 0 || n != y.len() {
            return Err(Error::InvalidDimensions {
                width: p,
                height: n,
            });
        }
        if !(alpha >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "alpha",
                value: alpha.to_string(),
                reason: "must be non-negative".into(),
            });
        }

        let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(p));
        let y_mean = y.mean().unwrap_or(0.0);
        let xc = &x - &x_mean;
        let yc = &y - y_mean;

        let mut gram: Array2<f64> = xc.t().dot(&xc);
        for j in 0..p {
            gram[[j, j]] += alpha;
        }
        let rhs: Array1<f64> = xc.t().dot(&yc);

        let coefficients = solve(gram, rhs)?;
        let intercept = y_mean - x_mean.dot(&coefficients);

        Ok(Self {
            alpha,
            intercept,
            coefficients: coefficients.to_vec(),
        })
    }

    /// Predict one sample
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    /// Predict every row of `x`
    pub fn predict_rows(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.rows()
            .into_iter()
            .map(|row| self.predict(&row.to_vec()))
            .collect()
    }
}

/// Gaussian elimination with partial pivoting
fn solve(mut mat: Array2<f64>, mut rhs: Array1<f64>) -> Result<Array1<f64>> {
    let p = rhs.len();
    for col in 0..p {
        let mut max_val = mat[[col, col]].abs();
        let mut max_row = col;
        for row in (col + 1)..p {
            let val = mat[[row, col]].abs();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }

        if max_val < 1e-12 {
            return Err(Error::Algorithm(
                "Ridge: singular system (constant features with alpha = 0?)".into(),
            ));
        }

        if max_row != col {
            for j in 0..p {
                mat.swap([col, j], [max_row, j]);
            }
            rhs.swap(col, max_row);
        }

        let pivot = mat[[col, col]];
        for row in (col + 1)..p {
            let factor = mat[[row, col]] / pivot;
            mat[[row, col]] = 0.0;
            for j in (col + 1)..p {
                mat[[row, j]] -= factor * mat[[col, j]];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut beta = Array1::zeros(p);
    for col in (0..p).rev() {
        let mut sum = rhs[col];
        for j in (col + 1)..p {
            sum -= mat[[col, j]] * beta[j];
        }
        beta[col] = sum / mat[[col, col]];
    }
    Ok(beta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_unpenalised_fit_recovers_plane() {
        // y = 2 + 3 a - b
        let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 3.0]];
        let y = x.rows().into_iter().map(|r| 2.0 + 3.0 * r[0] - r[1]).collect::<Array1<f64>>();
        let model = RidgeModel::fit(x.view(), y.view(), 0.0).unwrap();
        assert_relative_eq!(model.intercept, 2.0, epsilon = 1e-9);
        assert_relative_eq!(model.coefficients[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(model.coefficients[1], -1.0, epsilon = 1e-9);
        assert_relative_eq!(model.predict(&[4.0, 2.0]), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_penalty_shrinks_slope() {
        // Centred x = [-1, 0, 1], y = 2x: w = 4 / (2 + alpha)
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![0.0, 2.0, 4.0];
        let model = RidgeModel::fit(x.view(), y.view(), 2.0).unwrap();
        assert_relative_eq!(model.coefficients[0], 1.0, epsilon = 1e-12);
        // Intercept keeps predictions centred on the target mean
        assert_relative_eq!(model.predict(&[1.0]), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_feature_needs_penalty() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let y = array![1.0, 2.0, 3.0];
        assert!(RidgeModel::fit(x.view(), y.view(), 0.0).is_err());
        let model = RidgeModel::fit(x.view(), y.view(), 1.0).unwrap();
        assert_relative_eq!(model.coefficients[1], 0.0);
        let preds = model.predict_rows(x.view());
        assert_relative_eq!(preds.mean().unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mismatched_lengths() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0];
        assert!(RidgeModel::fit(x.view(), y.view(), 1.0).is_err());
    }
}
