//! Trade: a closed round trip on the spread.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::Direction;

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// |z| breached the stop-loss threshold.
    StopLoss,
    /// z reverted inside the exit band.
    MeanReversion,
    /// Last available bar; position force-closed.
    EndOfData,
    /// z-score undefined on this bar; position force-closed to FLAT.
    DataQuality,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StopLoss => "stop_loss",
            Self::MeanReversion => "mean_reversion",
            Self::EndOfData => "end_of_data",
            Self::DataQuality => "data_quality",
        }
    }
}

/// Immutable record created on an exit event and appended to the trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: Direction,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_spread: f64,
    pub entry_zscore: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub exit_spread: f64,
    /// None when the exit was forced by an undefined z-score.
    pub exit_zscore: Option<f64>,
    pub exit_reason: ExitReason,

    // ── Size ──
    /// Leverage multiplier chosen by the risk sizer at entry.
    pub size_multiplier: f64,
    /// Spread units held (fixed for the trade's duration).
    pub units: f64,

    // ── PnL ──
    pub gross_pnl: f64,
    pub cost: f64,
    pub pnl: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}
