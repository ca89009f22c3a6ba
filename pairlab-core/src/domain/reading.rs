//! Reading: an explicitly defined-or-undefined numeric value.
//!
//! Z-scores, volatilities, and report statistics use this instead of NaN so an
//! undefined value can never leak silently into arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a value could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Undefined {
    /// Fewer observations than the window or statistic requires.
    InsufficientWindow,
    /// Denominator variance is zero (or numerically indistinguishable from zero).
    ZeroVariance,
    /// An input was NaN or infinite.
    NonFinite,
    /// Ratio with an empty population (e.g. win rate with no trades).
    NoObservations,
    /// The comparison series was not supplied.
    NoBenchmark,
}

impl fmt::Display for Undefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InsufficientWindow => "insufficient observations in window",
            Self::ZeroVariance => "zero variance",
            Self::NonFinite => "non-finite input",
            Self::NoObservations => "no observations",
            Self::NoBenchmark => "no benchmark supplied",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reading {
    Defined(f64),
    Undefined(Undefined),
}

impl Reading {
    /// Wrap a computed value, demoting NaN/inf to `Undefined(NonFinite)`.
    pub fn checked(value: f64) -> Self {
        if value.is_finite() {
            Self::Defined(value)
        } else {
            Self::Undefined(Undefined::NonFinite)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(*v),
            Self::Undefined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }

    pub fn reason(&self) -> Option<Undefined> {
        match self {
            Self::Defined(_) => None,
            Self::Undefined(r) => Some(*r),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(v) => write!(f, "{v:.4}"),
            Self::Undefined(_) => f.write_str("n/a"),
        }
    }
}
