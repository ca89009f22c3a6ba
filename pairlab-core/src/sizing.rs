//! Volatility-targeted position sizing.
//!
//! # Formula
//! ```text
//! vol        = stdev(Δspread over the trailing window) / gross_notional[t]
//! multiplier = min(target_risk_fraction / vol, max_leverage)
//! units      = multiplier · equity / gross_notional[t]
//! ```
//!
//! Sizing fails closed: undefined or non-positive volatility yields a zero
//! multiplier and the entry is skipped.

use crate::config::StrategyParams;
use crate::domain::{Reading, Undefined};
use crate::stats::{diff, sample_std};

#[derive(Debug, Clone)]
pub struct RiskSizer {
    /// Fraction of equity risked per unit of volatility (e.g., 0.01 = 1%)
    target_risk_fraction: f64,

    /// Upper bound on the multiplier
    max_leverage: f64,

    /// Number of trailing spread changes
    volatility_window: usize,
}

impl RiskSizer {
    pub fn new(target_risk_fraction: f64, max_leverage: f64, volatility_window: usize) -> Self {
        Self {
            target_risk_fraction,
            max_leverage,
            volatility_window,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        Self::new(
            params.target_risk_fraction,
            params.max_leverage,
            params.volatility_window,
        )
    }

    /// Fractional volatility of the spread at bar `t`, using only bars up to `t`.
    pub fn realized_volatility(&self, spread: &[f64], gross_notional: &[f64], t: usize) -> Reading {
        let w = self.volatility_window;
        if w < 2 || t >= spread.len() || t >= gross_notional.len() || t < w {
            return Reading::Undefined(Undefined::InsufficientWindow);
        }
        let changes = diff(&spread[t - w..=t]);
        let Some(sd) = sample_std(&changes) else {
            return Reading::Undefined(Undefined::InsufficientWindow);
        };
        let notional = gross_notional[t];
        if !(notional.is_finite() && notional > 0.0) {
            return Reading::Undefined(Undefined::NonFinite);
        }
        Reading::checked(sd / notional)
    }

    /// Size multiplier for a given volatility reading. Zero means skip.
    pub fn multiplier(&self, volatility: Reading) -> f64 {
        match volatility {
            Reading::Defined(vol) if vol > 0.0 => {
                (self.target_risk_fraction / vol).min(self.max_leverage)
            }
            _ => 0.0,
        }
    }

    /// Spread units to trade for `equity` at a bar with `gross_notional`.
    pub fn units(&self, multiplier: f64, equity: f64, gross_notional: f64) -> f64 {
        if multiplier <= 0.0 || equity <= 0.0 || gross_notional <= 0.0 {
            return 0.0;
        }
        multiplier * equity / gross_notional
    }
}
