//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar
//! out. Metrics that can be undefined (zero variance, no trades, no benchmark)
//! return `Err(AnalysisError::UndefinedStatistic)` instead of a sentinel float;
//! the report stores them as `Reading`s.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use pairlab_core::domain::{EquityCurve, PairCandidate, Reading, Trade, Undefined};
use pairlab_core::stats::{mean, sample_std};
use pairlab_core::{AnalysisError, SimulationResult};

/// Return stddev at or below this is treated as zero.
const RETURN_STD_EPSILON: f64 = 1e-12;

/// Summary statistics for one simulated pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_return: Reading,
    pub annualized_return: Reading,
    pub sharpe: Reading,
    /// Negative fraction, e.g. -0.15 for a 15% drawdown.
    pub max_drawdown: f64,
    pub win_rate: Reading,
    pub profit_factor: Reading,
    pub average_trade_pnl: Reading,
    /// Annualized strategy return minus annualized benchmark return.
    pub annualized_alpha: Reading,
    pub buy_and_hold_return: Reading,
    pub benchmark_return: Reading,
    pub trade_count: usize,
    /// Fraction of simulated bars ending in a position.
    pub exposure: f64,
    pub data_quality_notes: usize,
    pub final_equity: f64,
}

#[derive(Debug, Clone)]
pub struct PerformanceAnalyzer {
    annualization_factor: u32,
}

impl PerformanceAnalyzer {
    pub fn new(annualization_factor: u32) -> Self {
        Self {
            annualization_factor,
        }
    }

    /// Score a simulation against its buy-and-hold and benchmark curves.
    ///
    /// All curves must share the simulation's date index. The report is either
    /// complete or not produced.
    pub fn analyze(
        &self,
        sim: &SimulationResult,
        buy_and_hold: &EquityCurve,
        benchmark: Option<&EquityCurve>,
    ) -> Result<PerformanceReport, AnalysisError> {
        let equity = &sim.equity;
        if equity.is_empty() {
            return Err(AnalysisError::insufficient("performance analysis", 1, 0));
        }
        check_aligned(equity, buy_and_hold, "buy-and-hold")?;
        if let Some(bench) = benchmark {
            check_aligned(equity, bench, "benchmark")?;
        }

        let af = self.annualization_factor;
        let alpha = match benchmark {
            Some(bench) => reading(annualized_alpha(equity, bench, af), Undefined::NonFinite)?,
            None => Reading::Undefined(Undefined::NoBenchmark),
        };
        let benchmark_return = match benchmark {
            Some(bench) => reading(total_return(bench), Undefined::NonFinite)?,
            None => Reading::Undefined(Undefined::NoBenchmark),
        };

        Ok(PerformanceReport {
            total_return: reading(total_return(equity), Undefined::NonFinite)?,
            annualized_return: reading(annualized_return(equity, af), Undefined::NonFinite)?,
            sharpe: reading(sharpe_ratio(equity, af), Undefined::ZeroVariance)?,
            max_drawdown: max_drawdown(equity),
            win_rate: reading(win_rate(&sim.trades), Undefined::NoObservations)?,
            profit_factor: reading(profit_factor(&sim.trades), Undefined::NoObservations)?,
            average_trade_pnl: reading(average_trade_pnl(&sim.trades), Undefined::NoObservations)?,
            annualized_alpha: alpha,
            buy_and_hold_return: reading(total_return(buy_and_hold), Undefined::NonFinite)?,
            benchmark_return,
            trade_count: sim.trades.len(),
            exposure: sim.exposure(),
            data_quality_notes: sim.notes.len(),
            final_equity: equity.final_value().unwrap_or(sim.initial_capital),
        })
    }
}

/// Collapse a metric result into a `Reading`.
///
/// Too-short inputs map to `InsufficientWindow`; an undefined statistic maps to
/// the metric's typical cause `undefined_as`. Misaligned or invalid inputs are
/// not a property of the metric and propagate.
fn reading(
    result: Result<f64, AnalysisError>,
    undefined_as: Undefined,
) -> Result<Reading, AnalysisError> {
    match result {
        Ok(v) => Ok(Reading::checked(v)),
        Err(AnalysisError::InsufficientData { .. }) => {
            Ok(Reading::Undefined(Undefined::InsufficientWindow))
        }
        Err(AnalysisError::UndefinedStatistic { .. }) => Ok(Reading::Undefined(undefined_as)),
        Err(AnalysisError::DegenerateRegression { .. }) => {
            Ok(Reading::Undefined(Undefined::NonFinite))
        }
        Err(e @ (AnalysisError::DataAlignment(_) | AnalysisError::InvalidSeries { .. })) => Err(e),
    }
}

fn check_aligned(
    equity: &EquityCurve,
    other: &EquityCurve,
    what: &str,
) -> Result<(), AnalysisError> {
    if equity.dates != other.dates {
        return Err(AnalysisError::DataAlignment(format!(
            "{what} curve is not on the strategy's index ({} vs {} bars)",
            other.len(),
            equity.len()
        )));
    }
    Ok(())
}

// ─── Reference curves ───────────────────────────────────────────────

/// Capital split equally across both legs on the first bar of `range`, then held.
pub fn buy_and_hold_curve(pair: &PairCandidate, range: Range<usize>, capital: f64) -> EquityCurve {
    let half = capital / 2.0;
    let start = range.start;
    let (a0, b0) = (pair.prices_a[start], pair.prices_b[start]);
    let values = range
        .clone()
        .map(|t| half * pair.prices_a[t] / a0 + half * pair.prices_b[t] / b0)
        .collect();
    EquityCurve::new(pair.dates[range].to_vec(), values)
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: final / initial - 1.
pub fn total_return(curve: &EquityCurve) -> Result<f64, AnalysisError> {
    let (Some(initial), Some(last)) = (curve.initial(), curve.final_value()) else {
        return Err(AnalysisError::insufficient("total return", 1, 0));
    };
    if initial <= 0.0 {
        return Err(AnalysisError::undefined(
            "total return",
            "non-positive initial equity",
        ));
    }
    Ok(last / initial - 1.0)
}

/// Geometric annualized return: (final / initial)^(af / periods) - 1.
pub fn annualized_return(curve: &EquityCurve, annualization_factor: u32) -> Result<f64, AnalysisError> {
    if curve.len() < 2 {
        return Err(AnalysisError::insufficient("annualized return", 2, curve.len()));
    }
    let growth = total_return(curve)? + 1.0;
    if growth <= 0.0 {
        return Err(AnalysisError::undefined(
            "annualized return",
            "equity fell to or below zero",
        ));
    }
    let periods = (curve.len() - 1) as f64;
    Ok(growth.powf(annualization_factor as f64 / periods) - 1.0)
}

/// Sharpe = mean(per-bar returns) / stdev(per-bar returns) · √af.
///
/// Zero return variance is undefined, not zero.
pub fn sharpe_ratio(curve: &EquityCurve, annualization_factor: u32) -> Result<f64, AnalysisError> {
    let returns = curve.returns();
    if returns.len() < 2 {
        return Err(AnalysisError::insufficient("sharpe ratio", 3, curve.len()));
    }
    let (Some(mu), Some(sd)) = (mean(&returns), sample_std(&returns)) else {
        return Err(AnalysisError::insufficient("sharpe ratio", 3, curve.len()));
    };
    if sd <= RETURN_STD_EPSILON {
        return Err(AnalysisError::undefined("sharpe ratio", "zero return variance"));
    }
    Ok(mu / sd * (annualization_factor as f64).sqrt())
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity never falls below a prior peak.
pub fn max_drawdown(curve: &EquityCurve) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in &curve.values {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Fraction of closed trades with positive P&L. Undefined with no trades.
pub fn win_rate(trades: &[Trade]) -> Result<f64, AnalysisError> {
    if trades.is_empty() {
        return Err(AnalysisError::undefined("win rate", "no closed trades"));
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    Ok(winners as f64 / trades.len() as f64)
}

/// Gross profits / gross losses. Undefined with no losing trades.
pub fn profit_factor(trades: &[Trade]) -> Result<f64, AnalysisError> {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();
    if gross_loss <= 0.0 {
        return Err(AnalysisError::undefined("profit factor", "no losing trades"));
    }
    Ok(gross_profit / gross_loss)
}

pub fn average_trade_pnl(trades: &[Trade]) -> Result<f64, AnalysisError> {
    if trades.is_empty() {
        return Err(AnalysisError::undefined("average trade", "no closed trades"));
    }
    Ok(trades.iter().map(|t| t.pnl).sum::<f64>() / trades.len() as f64)
}

/// Simple difference of annualized returns, not a regression alpha.
pub fn annualized_alpha(
    strategy: &EquityCurve,
    benchmark: &EquityCurve,
    annualization_factor: u32,
) -> Result<f64, AnalysisError> {
    if strategy.len() != benchmark.len() {
        return Err(AnalysisError::DataAlignment(format!(
            "strategy has {} bars, benchmark {}",
            strategy.len(),
            benchmark.len()
        )));
    }
    Ok(annualized_return(strategy, annualization_factor)?
        - annualized_return(benchmark, annualization_factor)?)
}
