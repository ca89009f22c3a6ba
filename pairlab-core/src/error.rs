//! Error taxonomy for the analytical pipeline.
//!
//! Conditions that affect one timestamp (an undefined z-score bar) never surface
//! here; the simulator forces FLAT and records a data-quality note instead. These
//! variants are reserved for conditions that make a whole pair's analysis
//! meaningless.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("insufficient data for {context}: need at least {needed} observations, got {got}")]
    InsufficientData {
        context: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("degenerate regression: regressor variance {variance:e} is effectively zero")]
    DegenerateRegression { variance: f64 },

    #[error("undefined statistic '{statistic}': {reason}")]
    UndefinedStatistic {
        statistic: &'static str,
        reason: String,
    },

    #[error("data alignment error: {0}")]
    DataAlignment(String),

    #[error("invalid price series '{symbol}': {reason}")]
    InvalidSeries { symbol: String, reason: String },
}

impl AnalysisError {
    pub fn insufficient(context: &'static str, needed: usize, got: usize) -> Self {
        Self::InsufficientData {
            context,
            needed,
            got,
        }
    }

    pub fn undefined(statistic: &'static str, reason: impl Into<String>) -> Self {
        Self::UndefinedStatistic {
            statistic,
            reason: reason.into(),
        }
    }
}
