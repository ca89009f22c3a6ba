//! Ordinary least squares.
//!
//! `simple_ols` is the closed-form single-regressor fit used for hedge ratios.
//! `least_squares` handles the multi-regressor ADF lag augmentation through an
//! SVD of the design matrix.

use nalgebra::{DMatrix, DVector};

use crate::error::AnalysisError;

/// Regressor variance below `DEGENERATE_VARIANCE * max(1, mean²)` is rejected.
pub const DEGENERATE_VARIANCE: f64 = 1e-12;

/// Result of `y = intercept + slope * x + e`.
#[derive(Debug, Clone)]
pub struct SimpleFit {
    pub slope: f64,
    pub intercept: f64,
    pub residuals: Vec<f64>,
    pub r_squared: f64,
}

pub fn simple_ols(y: &[f64], x: &[f64]) -> Result<SimpleFit, AnalysisError> {
    if y.len() != x.len() {
        return Err(AnalysisError::DataAlignment(format!(
            "regression inputs differ in length ({} vs {})",
            y.len(),
            x.len()
        )));
    }
    let n = x.len();
    if n < 3 {
        return Err(AnalysisError::insufficient("regression", 3, n));
    }
    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let variance = sxx / nf;
    if !variance.is_finite() || variance <= DEGENERATE_VARIANCE * mean_x.powi(2).max(1.0) {
        return Err(AnalysisError::DegenerateRegression { variance });
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let residuals: Vec<f64> = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| yi - (intercept + slope * xi))
        .collect();
    let ssr: f64 = residuals.iter().map(|e| e * e).sum();
    let r_squared = if syy > 0.0 { 1.0 - ssr / syy } else { 1.0 };

    Ok(SimpleFit {
        slope,
        intercept,
        residuals,
        r_squared,
    })
}

/// Multi-regressor fit without an implicit constant.
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    /// Sum of squared residuals.
    pub ssr: f64,
    pub nobs: usize,
}

impl LeastSquaresFit {
    pub fn t_value(&self, i: usize) -> f64 {
        self.coefficients[i] / self.std_errors[i]
    }

    /// Gaussian log-likelihood AIC: n(ln 2π + ln(ssr/n) + 1) + 2k.
    pub fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        let k = self.coefficients.len() as f64;
        n * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0) + 2.0 * k
    }
}

/// Regress `y` on the given regressor columns (each the same length as `y`).
///
/// Solved through the SVD of the design matrix. A design whose smallest
/// singular value falls below `largest · max(n, k) · ε` is rank deficient and
/// rejected as `DegenerateRegression`.
pub fn least_squares(y: &[f64], columns: &[&[f64]]) -> Result<LeastSquaresFit, AnalysisError> {
    let n = y.len();
    let k = columns.len();
    if k == 0 {
        return Err(AnalysisError::DataAlignment("no regressors supplied".into()));
    }
    if columns.iter().any(|c| c.len() != n) {
        return Err(AnalysisError::DataAlignment(
            "regressor columns differ in length from the response".into(),
        ));
    }
    if n <= k {
        return Err(AnalysisError::insufficient("least squares", k + 1, n));
    }

    let x = DMatrix::from_fn(n, k, |r, c| columns[c][r]);
    let response = DVector::from_column_slice(y);

    let svd = x.clone().svd(true, true);
    let singular = &svd.singular_values;
    let largest = singular.max();
    let smallest = singular.min();
    let tolerance = largest * n.max(k) as f64 * f64::EPSILON;
    let degenerate = AnalysisError::DegenerateRegression {
        variance: smallest * smallest / n as f64,
    };
    if !smallest.is_finite() || smallest <= tolerance {
        return Err(degenerate);
    }

    let beta = svd.solve(&response, tolerance).map_err(|_| degenerate.clone())?;
    let v_t = svd.v_t.as_ref().ok_or(degenerate)?;

    let residuals = &response - &x * &beta;
    let ssr = residuals.norm_squared();
    let sigma2 = ssr / (n - k) as f64;

    // diag((X'X)⁻¹) = Σ_j V[i,j]² / s_j²
    let std_errors = (0..k)
        .map(|i| {
            let diag: f64 = (0..k).map(|j| (v_t[(j, i)] / singular[j]).powi(2)).sum();
            (sigma2 * diag).sqrt()
        })
        .collect();

    Ok(LeastSquaresFit {
        coefficients: beta.iter().copied().collect(),
        std_errors,
        ssr,
        nobs: n,
    })
}
