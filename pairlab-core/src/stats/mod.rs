//! Numerical building blocks: descriptive statistics, least squares, unit-root
//! testing and MacKinnon response surfaces.
//!
//! Everything here is a pure function over slices.

pub mod adf;
pub mod mackinnon;
pub mod ols;

pub use adf::{adf_test, AdfResult};
pub use mackinnon::{engle_granger_critical_values, engle_granger_p_value, CriticalValues};
pub use ols::{least_squares, simple_ols, LeastSquaresFit, SimpleFit};

/// Standard deviations at or below this are treated as zero.
pub const ZERO_STD_EPSILON: f64 = 1e-9;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). None for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Population variance (n denominator).
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// First differences: out[i] = values[i + 1] - values[i].
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
