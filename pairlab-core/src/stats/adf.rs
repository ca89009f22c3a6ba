//! Augmented Dickey-Fuller unit-root test without a deterministic term.
//!
//! Used on Engle-Granger residuals, which already have zero mean from the
//! cointegrating regression's intercept.
//!
//! ```text
//! Δy[t] = γ·y[t-1] + Σ_{i=1..p} φ_i·Δy[t-i] + ε
//! ```
//!
//! The statistic is the t-value of γ. The lag count p is picked by AIC over
//! 0..=max_lag on a common sample, then the winning model is refit on the
//! longest sample it allows. Lag orders whose design is rank deficient (a
//! periodic residual makes the augmented columns collinear) drop out of the
//! search; only a singular lag-0 design fails the test.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::diff;
use super::ols::{least_squares, LeastSquaresFit};
use crate::error::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub used_lag: usize,
    /// Observations in the final regression.
    pub nobs: usize,
}

/// Schwert's rule ⌈12·(n/100)^¼⌉, capped so the regression keeps enough rows.
pub fn default_max_lag(n: usize) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    schwert.min(max_feasible_lag(n))
}

/// Largest p leaving at least two residual degrees of freedom on the
/// common sample: (n - 1 - p) rows against p + 1 regressors.
fn max_feasible_lag(n: usize) -> usize {
    n.saturating_sub(3) / 2
}

pub fn adf_test(series: &[f64], max_lag: Option<usize>) -> Result<AdfResult, AnalysisError> {
    let n = series.len();
    if n < 6 {
        return Err(AnalysisError::insufficient("ADF test", 6, n));
    }
    let max_lag = max_lag
        .unwrap_or_else(|| default_max_lag(n))
        .min(max_feasible_lag(n));

    let dy = diff(series);

    // Lag search on the common sample (first max_lag differences reserved).
    let mut best: Option<(usize, f64)> = None;
    for lag in 0..=max_lag {
        let fit = match fit_with_lags(series, &dy, lag, max_lag) {
            Ok(fit) => fit,
            Err(AnalysisError::DegenerateRegression { .. }) if lag > 0 => {
                debug!(lag, "rank-deficient lag augmentation, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };
        let aic = fit.aic();
        if aic.is_nan() {
            continue;
        }
        match best {
            Some((_, best_aic)) if aic >= best_aic => {}
            _ => best = Some((lag, aic)),
        }
    }
    let used_lag = best.map(|(lag, _)| lag).unwrap_or(0);

    let fit = fit_with_lags(series, &dy, used_lag, used_lag)?;
    let statistic = fit.t_value(0);
    if statistic.is_nan() {
        return Err(AnalysisError::undefined(
            "ADF statistic",
            "zero coefficient with zero standard error",
        ));
    }
    Ok(AdfResult {
        statistic,
        used_lag,
        nobs: fit.nobs,
    })
}

/// Fit with `lag` augmentation terms on rows starting after `reserve` lags.
fn fit_with_lags(
    series: &[f64],
    dy: &[f64],
    lag: usize,
    reserve: usize,
) -> Result<LeastSquaresFit, AnalysisError> {
    // Row t (index into dy) runs from `reserve` to dy.len() - 1.
    let rows = reserve..dy.len();
    let response: Vec<f64> = rows.clone().map(|t| dy[t]).collect();

    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(lag + 1);
    // dy[t] = y[t+1] - y[t], so the lagged level is y[t].
    columns.push(rows.clone().map(|t| series[t]).collect());
    for i in 1..=lag {
        columns.push(rows.clone().map(|t| dy[t - i]).collect());
    }
    let refs: Vec<&[f64]> = columns.iter().map(|c| c.as_slice()).collect();
    least_squares(&response, &refs)
}
