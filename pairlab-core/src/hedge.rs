//! Hedge ratio estimation.
//!
//! The ratio is estimated once and frozen. It is never re-fit as the
//! simulation advances, so any look-ahead it carries comes only from the
//! estimation window recorded on the result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::PairCandidate;
use crate::error::AnalysisError;
use crate::stats::simple_ols;

/// Which observations the hedge ratio was fit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimationWindow {
    /// Every aligned observation. Signals built from it see the future.
    FullSample { observations: usize },
    /// The leading `observations` bars, ending on `end_date` inclusive.
    Training {
        observations: usize,
        end_date: NaiveDate,
    },
}

impl EstimationWindow {
    pub fn observations(&self) -> usize {
        match self {
            Self::FullSample { observations } | Self::Training { observations, .. } => {
                *observations
            }
        }
    }

    pub fn is_full_sample(&self) -> bool {
        matches!(self, Self::FullSample { .. })
    }
}

/// `A ≈ intercept + slope · B`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeRatio {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub window: EstimationWindow,
}

impl HedgeRatio {
    pub fn spread(&self, price_a: f64, price_b: f64) -> f64 {
        price_a - (self.slope * price_b + self.intercept)
    }

    /// Inverse of [`HedgeRatio::spread`].
    pub fn reconstruct_a(&self, price_b: f64, spread: f64) -> f64 {
        spread + self.slope * price_b + self.intercept
    }

    /// Capital tied up by one unit of spread: one A share plus |β| B shares.
    pub fn gross_notional(&self, price_a: f64, price_b: f64) -> f64 {
        price_a.abs() + self.slope.abs() * price_b.abs()
    }
}

#[derive(Debug, Clone)]
pub struct HedgeRatioEstimator {
    min_observations: usize,
}

impl HedgeRatioEstimator {
    pub fn new(min_observations: usize) -> Self {
        Self { min_observations }
    }

    /// Fit on every observation of the pair.
    pub fn estimate(&self, pair: &PairCandidate) -> Result<HedgeRatio, AnalysisError> {
        let window = EstimationWindow::FullSample {
            observations: pair.len(),
        };
        self.fit(&pair.prices_a, &pair.prices_b, window)
    }

    /// Fit on the first `training_len` observations only.
    pub fn estimate_training(
        &self,
        pair: &PairCandidate,
        training_len: usize,
    ) -> Result<HedgeRatio, AnalysisError> {
        if training_len == 0 || training_len > pair.len() {
            return Err(AnalysisError::insufficient(
                "hedge ratio training window",
                self.min_observations.max(1),
                training_len.min(pair.len()),
            ));
        }
        let window = EstimationWindow::Training {
            observations: training_len,
            end_date: pair.dates[training_len - 1],
        };
        self.fit(
            &pair.prices_a[..training_len],
            &pair.prices_b[..training_len],
            window,
        )
    }

    fn fit(
        &self,
        a: &[f64],
        b: &[f64],
        window: EstimationWindow,
    ) -> Result<HedgeRatio, AnalysisError> {
        if a.len() < self.min_observations {
            return Err(AnalysisError::insufficient(
                "hedge ratio",
                self.min_observations,
                a.len(),
            ));
        }
        let fit = simple_ols(a, b)?;
        debug!(slope = fit.slope, intercept = fit.intercept, ?window, "estimated hedge ratio");
        Ok(HedgeRatio {
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            window,
        })
    }
}
