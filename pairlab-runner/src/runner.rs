//! Per-pair pipeline: wires screening, estimation, signal, simulation and
//! performance analysis.
//!
//! Entry points:
//! - `run_pair()`: the full pipeline for one configured pair, never fails;
//!   pair-level problems come back as `PairOutcome::Skipped` with a reason.
//! - `run_universe()`: every configured pair on the rayon pool, order preserved.
//! - `screen_only()`: alignment plus cointegration screen and hedge ratio, used
//!   by the `screen` command.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use pairlab_core::domain::{EquityCurve, PairCandidate, PositionState, PriceSeriesStore, Trade};
use pairlab_core::{
    AnalysisError, CointegrationResult, CointegrationScreener, DataQualityNote, HedgeRatio,
    HedgeRatioEstimator, SpreadSignalBuilder, StrategyParams, TradingSimulator, ZScoreWindow,
};

use crate::config::{ConfigError, PairSpec, RunConfig, RunId};
use crate::data_loader::{load_universe, LoadError, LoadOptions, LoadedData};
use crate::metrics::{buy_and_hold_curve, PerformanceAnalyzer, PerformanceReport};

/// Errors that abort a whole run (as opposed to a single pair).
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Why a pair produced no report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientData,
    DegenerateRegression,
    NotCointegrated,
    DataAlignment,
    UndefinedStatistic,
    InvalidSeries,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient_data",
            Self::DegenerateRegression => "degenerate_regression",
            Self::NotCointegrated => "not_cointegrated",
            Self::DataAlignment => "data_alignment",
            Self::UndefinedStatistic => "undefined_statistic",
            Self::InvalidSeries => "invalid_series",
        }
    }
}

impl From<&AnalysisError> for SkipReason {
    fn from(err: &AnalysisError) -> Self {
        match err {
            AnalysisError::InsufficientData { .. } => Self::InsufficientData,
            AnalysisError::DegenerateRegression { .. } => Self::DegenerateRegression,
            AnalysisError::UndefinedStatistic { .. } => Self::UndefinedStatistic,
            AnalysisError::DataAlignment(_) => Self::DataAlignment,
            AnalysisError::InvalidSeries { .. } => Self::InvalidSeries,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedPair {
    pub pair: PairSpec,
    pub reason: SkipReason,
    pub detail: String,
    /// Present when the pair got as far as screening.
    pub screen: Option<CointegrationResult>,
}

/// Complete result of one pair's pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairResult {
    pub pair: PairSpec,
    pub screen: CointegrationResult,
    pub hedge: HedgeRatio,
    pub zscore_window: ZScoreWindow,
    /// Any z-score depended on later bars (full-sample mode or hedge).
    pub uses_future_data: bool,
    /// Aligned observations before any train/test split.
    pub aligned_bars: usize,
    /// Index of the first simulated bar.
    pub test_start: usize,
    pub report: PerformanceReport,
    pub trades: Vec<Trade>,
    pub equity: EquityCurve,
    pub buy_and_hold: EquityCurve,
    pub benchmark: Option<EquityCurve>,
    pub positions: Vec<PositionState>,
    pub notes: Vec<DataQualityNote>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairOutcome {
    Completed(Box<PairResult>),
    Skipped(SkippedPair),
}

impl PairOutcome {
    pub fn pair(&self) -> &PairSpec {
        match self {
            Self::Completed(r) => &r.pair,
            Self::Skipped(s) => &s.pair,
        }
    }

    pub fn completed(&self) -> Option<&PairResult> {
        match self {
            Self::Completed(r) => Some(r),
            Self::Skipped(_) => None,
        }
    }
}

/// Screen verdict plus hedge ratio, without simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenRow {
    pub pair: PairSpec,
    pub screen: CointegrationResult,
    pub hedge: HedgeRatio,
    pub estimation_bars: usize,
}

/// A pair-level failure carried up to the outcome.
struct PairFailure {
    reason: SkipReason,
    detail: String,
    screen: Option<CointegrationResult>,
}

impl From<AnalysisError> for PairFailure {
    fn from(err: AnalysisError) -> Self {
        Self {
            reason: SkipReason::from(&err),
            detail: err.to_string(),
            screen: None,
        }
    }
}

/// Run the full pipeline for one pair.
pub fn run_pair(
    store: &PriceSeriesStore,
    spec: &PairSpec,
    params: &StrategyParams,
    benchmark: Option<&str>,
) -> PairOutcome {
    match analyze_pair(store, spec, params, benchmark) {
        Ok(result) => {
            info!(
                pair = %spec.label(),
                trades = result.report.trade_count,
                sharpe = %result.report.sharpe,
                total_return = %result.report.total_return,
                "pair completed"
            );
            PairOutcome::Completed(Box::new(result))
        }
        Err(failure) => {
            warn!(
                pair = %spec.label(),
                reason = failure.reason.as_str(),
                detail = %failure.detail,
                "pair skipped"
            );
            PairOutcome::Skipped(SkippedPair {
                pair: spec.clone(),
                reason: failure.reason,
                detail: failure.detail,
                screen: failure.screen,
            })
        }
    }
}

/// Screen one pair on its estimation window and fit the hedge ratio.
pub fn screen_only(
    store: &PriceSeriesStore,
    spec: &PairSpec,
    params: &StrategyParams,
) -> Result<ScreenRow, AnalysisError> {
    let pair = store.pair(&spec.a, &spec.b, params.gap_policy)?;
    let (screen, hedge, estimation_bars) = screen_and_estimate(&pair, params)?;
    Ok(ScreenRow {
        pair: spec.clone(),
        screen,
        hedge,
        estimation_bars,
    })
}

fn screen_and_estimate(
    pair: &PairCandidate,
    params: &StrategyParams,
) -> Result<(CointegrationResult, HedgeRatio, usize), AnalysisError> {
    let estimator = HedgeRatioEstimator::new(params.min_observations);
    let screener = CointegrationScreener::from_params(params);
    match params.training_len(pair.len()) {
        Some(train) => {
            let training = pair.slice(0..train);
            let screen = screener.screen_pair(&training)?;
            let hedge = estimator.estimate_training(pair, train)?;
            Ok((screen, hedge, train))
        }
        None => {
            let screen = screener.screen_pair(pair)?;
            let hedge = estimator.estimate(pair)?;
            Ok((screen, hedge, pair.len()))
        }
    }
}

fn analyze_pair(
    store: &PriceSeriesStore,
    spec: &PairSpec,
    params: &StrategyParams,
    benchmark: Option<&str>,
) -> Result<PairResult, PairFailure> {
    let pair = store.pair(&spec.a, &spec.b, params.gap_policy)?;

    // Step 1: Screen on the estimation window
    let (screen, hedge, estimation_bars) = screen_and_estimate(&pair, params)?;
    if !screen.is_cointegrated {
        return Err(PairFailure {
            reason: SkipReason::NotCointegrated,
            detail: format!(
                "p-value {:.4} is not below threshold {}",
                screen.p_value, screen.p_threshold
            ),
            screen: Some(screen),
        });
    }

    // Step 2: Spread and z-scores over the whole index, hedge frozen
    let signal = SpreadSignalBuilder::new(params.zscore_window).build(&pair, &hedge)?;

    // Step 3: Simulate the test bars (all bars without a split)
    let range: Range<usize> = match params.training_fraction {
        Some(_) => estimation_bars..pair.len(),
        None => 0..pair.len(),
    };
    let with_screen = |err: AnalysisError| PairFailure {
        screen: Some(screen.clone()),
        ..PairFailure::from(err)
    };
    let sim = TradingSimulator::from_params(params)
        .run_range(&signal, range.clone())
        .map_err(with_screen)?;

    // Step 4: Reference curves on the same index
    let buy_and_hold = buy_and_hold_curve(&pair, range.clone(), params.initial_capital);
    let benchmark_curve = match benchmark {
        Some(symbol) => {
            let prices = store
                .aligned_to(symbol, &pair.dates[range.clone()], params.gap_policy)
                .map_err(with_screen)?;
            Some(EquityCurve::from_prices(
                &pair.dates[range.clone()],
                &prices,
                params.initial_capital,
            ))
        }
        None => None,
    };

    // Step 5: Score
    let report = PerformanceAnalyzer::new(params.annualization_factor)
        .analyze(&sim, &buy_and_hold, benchmark_curve.as_ref())
        .map_err(with_screen)?;

    Ok(PairResult {
        pair: spec.clone(),
        screen,
        hedge,
        zscore_window: params.zscore_window,
        uses_future_data: signal.uses_future_data,
        aligned_bars: pair.len(),
        test_start: range.start,
        report,
        trades: sim.trades,
        equity: sim.equity,
        buy_and_hold,
        benchmark: benchmark_curve,
        positions: sim.positions,
        notes: sim.notes,
    })
}

/// Every configured pair's outcome, in configuration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseRun {
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: RunConfig,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub outcomes: Vec<PairOutcome>,
}

impl UniverseRun {
    pub fn completed(&self) -> impl Iterator<Item = &PairResult> {
        self.outcomes.iter().filter_map(PairOutcome::completed)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SkippedPair> {
        self.outcomes.iter().filter_map(|o| match o {
            PairOutcome::Skipped(s) => Some(s),
            PairOutcome::Completed(_) => None,
        })
    }
}

/// Load the configured universe and run it.
pub fn load_and_run(config: &RunConfig, opts: &LoadOptions) -> Result<UniverseRun, RunError> {
    config.validate()?;
    let data = load_universe(config, opts)?;
    run_universe(config, &data)
}

/// Run every configured pair in parallel. Pairs share only the read-only store.
pub fn run_universe(config: &RunConfig, data: &LoadedData) -> Result<UniverseRun, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let benchmark = config.data.benchmark.as_deref();

    info!(run_id = %run_id, pairs = config.pairs.len(), "starting universe run");
    let outcomes: Vec<PairOutcome> = config
        .pairs
        .par_iter()
        .map(|spec| run_pair(&data.store, spec, &config.strategy, benchmark))
        .collect();

    let completed = outcomes.iter().filter(|o| o.completed().is_some()).count();
    info!(
        completed,
        skipped = outcomes.len() - completed,
        "universe run finished"
    );

    Ok(UniverseRun {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        dataset_hash: data.dataset_hash.clone(),
        has_synthetic: data.has_synthetic,
        outcomes,
    })
}
