//! Spread and z-score construction.
//!
//! ```text
//! spread[t] = A[t] - (β·B[t] + c)
//! z[t]      = (spread[t] - μ) / σ
//! ```
//!
//! Rolling mode: μ and σ over the trailing window t-w+1..=t (inclusive of the
//! current bar, sample stddev). Full-sample mode: μ and σ over every bar, which
//! leaks future information into each z-score and is flagged on the result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ZScoreWindow;
use crate::domain::{PairCandidate, Reading, Undefined};
use crate::error::AnalysisError;
use crate::hedge::HedgeRatio;
use crate::stats::{mean, sample_std, ZERO_STD_EPSILON};

/// Spread values on the pair's index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl SpreadSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything the simulator consumes, one entry per bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadSignal {
    pub dates: Vec<NaiveDate>,
    pub spread: Vec<f64>,
    pub zscores: Vec<Reading>,
    /// Capital per spread unit at each bar (|A| + |β|·|B|).
    pub gross_notional: Vec<f64>,
    pub window: ZScoreWindow,
    /// True when any bar's z-score depends on later bars, either through the
    /// normalization or through a full-sample hedge ratio.
    pub uses_future_data: bool,
}

impl SpreadSignal {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn defined_count(&self) -> usize {
        self.zscores.iter().filter(|z| z.is_defined()).count()
    }
}

#[derive(Debug, Clone)]
pub struct SpreadSignalBuilder {
    window: ZScoreWindow,
}

impl SpreadSignalBuilder {
    pub fn new(window: ZScoreWindow) -> Self {
        Self { window }
    }

    pub fn spread(&self, pair: &PairCandidate, hedge: &HedgeRatio) -> SpreadSeries {
        let values = pair
            .prices_a
            .iter()
            .zip(&pair.prices_b)
            .map(|(a, b)| hedge.spread(*a, *b))
            .collect();
        SpreadSeries {
            dates: pair.dates.clone(),
            values,
        }
    }

    pub fn build(
        &self,
        pair: &PairCandidate,
        hedge: &HedgeRatio,
    ) -> Result<SpreadSignal, AnalysisError> {
        if pair.prices_a.len() != pair.len() || pair.prices_b.len() != pair.len() {
            return Err(AnalysisError::DataAlignment(format!(
                "{}: legs are not on the pair index",
                pair.label()
            )));
        }
        if pair.is_empty() {
            return Err(AnalysisError::insufficient("spread signal", 1, 0));
        }
        let spread = self.spread(pair, hedge);
        let zscores = zscores(&spread.values, self.window);
        let gross_notional = pair
            .prices_a
            .iter()
            .zip(&pair.prices_b)
            .map(|(a, b)| hedge.gross_notional(*a, *b))
            .collect();

        Ok(SpreadSignal {
            dates: spread.dates,
            spread: spread.values,
            zscores,
            gross_notional,
            window: self.window,
            uses_future_data: self.window.uses_future_data() || hedge.window.is_full_sample(),
        })
    }
}

/// Z-score every bar of `spread` under `window`.
pub fn zscores(spread: &[f64], window: ZScoreWindow) -> Vec<Reading> {
    match window {
        ZScoreWindow::FullSample => {
            let stats = mean(spread).zip(sample_std(spread));
            spread.iter().map(|s| standardize(*s, stats)).collect()
        }
        ZScoreWindow::Rolling(w) => (0..spread.len())
            .map(|t| {
                if w < 2 || t + 1 < w {
                    return Reading::Undefined(Undefined::InsufficientWindow);
                }
                let slice = &spread[t + 1 - w..=t];
                standardize(spread[t], mean(slice).zip(sample_std(slice)))
            })
            .collect(),
    }
}

fn standardize(value: f64, stats: Option<(f64, f64)>) -> Reading {
    match stats {
        None => Reading::Undefined(Undefined::InsufficientWindow),
        Some((mu, sd)) if !(mu.is_finite() && sd.is_finite()) => {
            Reading::Undefined(Undefined::NonFinite)
        }
        Some((_, sd)) if sd <= ZERO_STD_EPSILON => Reading::Undefined(Undefined::ZeroVariance),
        Some((mu, sd)) => Reading::checked((value - mu) / sd),
    }
}
