//! Bar-by-bar trading simulation over a spread signal.
//!
//! Per bar, in chronological order:
//! 1. Decide an action from the state machine
//! 2. On entry: size with `RiskSizer`, freeze units for the trade
//! 3. On exit: close the trade, charge costs, book realized P&L
//! 4. Mark the open trade to market and record equity and state
//!
//! The simulator only reads `signal[..=t]` at bar `t`.

pub mod state_machine;

use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StrategyParams;
use crate::domain::{Direction, EquityCurve, ExitReason, PositionState, Reading, Trade, Undefined};
use crate::error::AnalysisError;
use crate::signal::SpreadSignal;
use crate::sizing::RiskSizer;

pub use state_machine::{decide, Action, Thresholds};

/// A bar where the simulator had to fall back to a safe state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityNote {
    pub index: usize,
    pub date: NaiveDate,
    pub issue: DataQualityIssue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityIssue {
    /// Z-score undefined; position forced (or kept) flat.
    UndefinedZScore { reason: Undefined },
    /// Entry signal fired but sizing returned zero.
    SizingRejected { volatility: Reading },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// State after each simulated bar.
    pub positions: Vec<PositionState>,
    pub equity: EquityCurve,
    pub trades: Vec<Trade>,
    pub notes: Vec<DataQualityNote>,
    pub initial_capital: f64,
    /// First simulated bar as an index into the signal.
    pub start_index: usize,
}

impl SimulationResult {
    pub fn total_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    /// Fraction of simulated bars ending in a position.
    pub fn exposure(&self) -> f64 {
        if self.positions.is_empty() {
            return 0.0;
        }
        let in_market = self.positions.iter().filter(|p| !p.is_flat()).count();
        in_market as f64 / self.positions.len() as f64
    }
}

#[derive(Debug, Clone)]
struct OpenTrade {
    direction: Direction,
    entry_index: usize,
    entry_spread: f64,
    entry_zscore: f64,
    entry_notional: f64,
    size_multiplier: f64,
    units: f64,
}

impl OpenTrade {
    fn mark(&self, spread: f64) -> f64 {
        self.units * self.direction.sign() * (spread - self.entry_spread)
    }
}

#[derive(Debug, Clone)]
pub struct TradingSimulator {
    thresholds: Thresholds,
    sizer: RiskSizer,
    transaction_cost_rate: f64,
    initial_capital: f64,
}

impl TradingSimulator {
    pub fn new(
        thresholds: Thresholds,
        sizer: RiskSizer,
        transaction_cost_rate: f64,
        initial_capital: f64,
    ) -> Self {
        Self {
            thresholds,
            sizer,
            transaction_cost_rate,
            initial_capital,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        Self::new(
            Thresholds::from_params(params),
            RiskSizer::from_params(params),
            params.transaction_cost_rate,
            params.initial_capital,
        )
    }

    /// Simulate every bar of the signal.
    pub fn run(&self, signal: &SpreadSignal) -> Result<SimulationResult, AnalysisError> {
        self.run_range(signal, 0..signal.len())
    }

    /// Simulate bars in `range`. Earlier bars are only used as volatility history.
    pub fn run_range(
        &self,
        signal: &SpreadSignal,
        range: Range<usize>,
    ) -> Result<SimulationResult, AnalysisError> {
        let n = signal.len();
        if signal.spread.len() != n || signal.zscores.len() != n || signal.gross_notional.len() != n
        {
            return Err(AnalysisError::DataAlignment(
                "signal columns differ in length".to_string(),
            ));
        }
        if range.end > n || range.start >= range.end {
            return Err(AnalysisError::insufficient(
                "simulation",
                1,
                range.end.min(n).saturating_sub(range.start),
            ));
        }

        let bars = range.len();
        let last = range.end - 1;
        let mut state = PositionState::Flat;
        let mut open: Option<OpenTrade> = None;
        let mut realized = 0.0;

        let mut positions = Vec::with_capacity(bars);
        let mut equity = Vec::with_capacity(bars);
        let mut trades = Vec::new();
        let mut notes = Vec::new();

        for t in range.clone() {
            let z = signal.zscores[t];
            if let Some(reason) = z.reason() {
                debug!(index = t, %reason, "undefined z-score, staying flat");
                notes.push(DataQualityNote {
                    index: t,
                    date: signal.dates[t],
                    issue: DataQualityIssue::UndefinedZScore { reason },
                });
            }

            match decide(state, z, t == last, &self.thresholds) {
                Action::Hold => {}
                Action::Enter(direction) => {
                    let volatility =
                        self.sizer
                            .realized_volatility(&signal.spread, &signal.gross_notional, t);
                    let multiplier = self.sizer.multiplier(volatility);
                    let notional = signal.gross_notional[t];
                    let units = self
                        .sizer
                        .units(multiplier, self.initial_capital + realized, notional);
                    if units > 0.0 {
                        open = Some(OpenTrade {
                            direction,
                            entry_index: t,
                            entry_spread: signal.spread[t],
                            entry_zscore: z.value().unwrap_or_default(),
                            entry_notional: notional,
                            size_multiplier: multiplier,
                            units,
                        });
                        state = direction.into();
                    } else {
                        debug!(index = t, ?volatility, "sizing rejected entry");
                        notes.push(DataQualityNote {
                            index: t,
                            date: signal.dates[t],
                            issue: DataQualityIssue::SizingRejected { volatility },
                        });
                    }
                }
                Action::Exit(reason) => {
                    if let Some(trade) = open.take() {
                        let closed = self.close(trade, signal, t, z, reason);
                        realized += closed.pnl;
                        info!(
                            direction = ?closed.direction,
                            entry = %closed.entry_date,
                            exit = %closed.exit_date,
                            reason = closed.exit_reason.as_str(),
                            pnl = closed.pnl,
                            "closed trade"
                        );
                        trades.push(closed);
                    }
                    state = PositionState::Flat;
                }
            }

            let mtm = open.as_ref().map_or(0.0, |o| o.mark(signal.spread[t]));
            positions.push(state);
            equity.push(self.initial_capital + realized + mtm);
        }

        Ok(SimulationResult {
            positions,
            equity: EquityCurve::new(signal.dates[range.clone()].to_vec(), equity),
            trades,
            notes,
            initial_capital: self.initial_capital,
            start_index: range.start,
        })
    }

    fn close(
        &self,
        open: OpenTrade,
        signal: &SpreadSignal,
        t: usize,
        z: Reading,
        reason: ExitReason,
    ) -> Trade {
        let exit_spread = signal.spread[t];
        let gross_pnl = open.mark(exit_spread);
        let cost = self.transaction_cost_rate
            * open.units
            * (open.entry_notional + signal.gross_notional[t]);
        Trade {
            direction: open.direction,
            entry_index: open.entry_index,
            entry_date: signal.dates[open.entry_index],
            entry_spread: open.entry_spread,
            entry_zscore: open.entry_zscore,
            exit_index: t,
            exit_date: signal.dates[t],
            exit_spread,
            exit_zscore: z.value(),
            exit_reason: reason,
            size_multiplier: open.size_multiplier,
            units: open.units,
            gross_pnl,
            cost,
            pnl: gross_pnl - cost,
        }
    }
}
