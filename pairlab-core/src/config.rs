//! Strategy parameters shared by every pipeline stage.
//!
//! Built once per run, validated, then passed by reference into each component.
//! Nothing in the pipeline reads global state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::GapPolicy;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{field} must be {requirement}, got {value}")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },
    #[error("thresholds must satisfy 0 < exit ({exit}) < entry ({entry}) < stop_loss ({stop})")]
    ThresholdOrder { exit: f64, entry: f64, stop: f64 },
}

/// Z-score normalization window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowSetting", into = "WindowSetting")]
pub enum ZScoreWindow {
    /// Trailing window of this many bars, inclusive of the current bar.
    Rolling(usize),
    /// Mean and stddev over the whole spread. Uses future data.
    FullSample,
}

impl ZScoreWindow {
    pub fn uses_future_data(self) -> bool {
        matches!(self, Self::FullSample)
    }
}

pub const FULL_SAMPLE: &str = "full-sample";

/// Wire form: an integer length or the `"full-sample"` sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WindowSetting {
    Length(usize),
    Sentinel(String),
}

impl TryFrom<WindowSetting> for ZScoreWindow {
    type Error = String;

    fn try_from(value: WindowSetting) -> Result<Self, Self::Error> {
        match value {
            WindowSetting::Length(n) => Ok(Self::Rolling(n)),
            WindowSetting::Sentinel(s) if s == FULL_SAMPLE => Ok(Self::FullSample),
            WindowSetting::Sentinel(s) => Err(format!(
                "zscore_window must be an integer or \"{FULL_SAMPLE}\", got \"{s}\""
            )),
        }
    }
}

impl From<ZScoreWindow> for WindowSetting {
    fn from(w: ZScoreWindow) -> Self {
        match w {
            ZScoreWindow::Rolling(n) => Self::Length(n),
            ZScoreWindow::FullSample => Self::Sentinel(FULL_SAMPLE.to_string()),
        }
    }
}

/// Every tunable of the pipeline. Thresholds are in z-score units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyParams {
    pub cointegration_p_threshold: f64,
    pub zscore_window: ZScoreWindow,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub stop_loss_threshold: f64,
    pub target_risk_fraction: f64,
    pub max_leverage: f64,
    pub transaction_cost_rate: f64,
    pub annualization_factor: u32,
    pub initial_capital: f64,
    /// Trailing spread changes used for realized volatility.
    pub volatility_window: usize,
    /// Minimum aligned observations for screening and estimation.
    pub min_observations: usize,
    pub gap_policy: GapPolicy,
    /// Leading share of the sample used for screening and hedge estimation.
    /// None means full-sample estimation.
    pub training_fraction: Option<f64>,
    /// ADF lag ceiling; None uses Schwert's rule.
    pub adf_max_lag: Option<usize>,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            cointegration_p_threshold: 0.05,
            zscore_window: ZScoreWindow::FullSample,
            entry_threshold: 1.5,
            exit_threshold: 0.3,
            stop_loss_threshold: 3.5,
            target_risk_fraction: 0.01,
            max_leverage: 5.0,
            transaction_cost_rate: 0.001,
            annualization_factor: 252,
            initial_capital: 100_000.0,
            volatility_window: 20,
            min_observations: 30,
            gap_policy: GapPolicy::Drop,
            training_fraction: None,
            adf_max_lag: None,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        let p = self.cointegration_p_threshold;
        if !(p > 0.0 && p < 1.0) {
            return Err(out_of_range("cointegration_p_threshold", "in (0, 1)", p));
        }
        if let ZScoreWindow::Rolling(n) = self.zscore_window {
            if n < 2 {
                return Err(out_of_range("zscore_window", ">= 2", n as f64));
            }
        }
        let (exit, entry, stop) = (
            self.exit_threshold,
            self.entry_threshold,
            self.stop_loss_threshold,
        );
        if !(exit > 0.0 && exit < entry && entry < stop) {
            return Err(ParamError::ThresholdOrder { exit, entry, stop });
        }
        if !(self.target_risk_fraction > 0.0 && self.target_risk_fraction.is_finite()) {
            return Err(out_of_range(
                "target_risk_fraction",
                "positive",
                self.target_risk_fraction,
            ));
        }
        if !(self.max_leverage > 0.0 && self.max_leverage.is_finite()) {
            return Err(out_of_range("max_leverage", "positive", self.max_leverage));
        }
        if !(self.transaction_cost_rate >= 0.0 && self.transaction_cost_rate < 1.0) {
            return Err(out_of_range(
                "transaction_cost_rate",
                "in [0, 1)",
                self.transaction_cost_rate,
            ));
        }
        if self.annualization_factor == 0 {
            return Err(out_of_range("annualization_factor", "positive", 0.0));
        }
        if !(self.initial_capital > 0.0 && self.initial_capital.is_finite()) {
            return Err(out_of_range(
                "initial_capital",
                "positive",
                self.initial_capital,
            ));
        }
        if self.volatility_window < 2 {
            return Err(out_of_range(
                "volatility_window",
                ">= 2",
                self.volatility_window as f64,
            ));
        }
        if self.min_observations < 10 {
            return Err(out_of_range(
                "min_observations",
                ">= 10",
                self.min_observations as f64,
            ));
        }
        if let Some(f) = self.training_fraction {
            if !(f > 0.0 && f < 1.0) {
                return Err(out_of_range("training_fraction", "in (0, 1)", f));
            }
        }
        Ok(())
    }
}

impl StrategyParams {
    /// Number of leading observations reserved for estimation out of `n`.
    pub fn training_len(&self, n: usize) -> Option<usize> {
        self.training_fraction
            .map(|f| ((f * n as f64).floor() as usize).min(n))
    }
}

fn out_of_range(field: &'static str, requirement: &'static str, value: f64) -> ParamError {
    ParamError::OutOfRange {
        field,
        requirement,
        value,
    }
}
