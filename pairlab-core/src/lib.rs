//! PairLab Core — the analytical pipeline of a pairs-trading backtest.
//!
//! Stages, leaf first:
//! - Domain types (price series, aligned pairs, readings, trades, positions)
//! - Statistics (OLS, ADF with AIC lag selection, MacKinnon surfaces)
//! - Engle-Granger cointegration screening
//! - Frozen hedge ratio estimation
//! - Spread and z-score construction (rolling or full-sample)
//! - Volatility-targeted sizing
//! - Entry/exit state machine and bar-by-bar simulation
//!
//! No I/O happens here. Data loading, orchestration and reporting live in
//! `pairlab-runner`.

pub mod cointegration;
pub mod config;
pub mod domain;
pub mod error;
pub mod hedge;
pub mod signal;
pub mod simulator;
pub mod sizing;
pub mod stats;

pub use cointegration::{CointegrationResult, CointegrationScreener};
pub use config::{ParamError, StrategyParams, ZScoreWindow};
pub use error::AnalysisError;
pub use hedge::{EstimationWindow, HedgeRatio, HedgeRatioEstimator};
pub use signal::{SpreadSeries, SpreadSignal, SpreadSignalBuilder};
pub use simulator::{DataQualityIssue, DataQualityNote, SimulationResult, TradingSimulator};
pub use sizing::RiskSizer;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: pipeline outputs can cross rayon worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceSeriesStore>();
        require_sync::<domain::PriceSeriesStore>();
        require_send::<domain::PairCandidate>();
        require_sync::<domain::PairCandidate>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::EquityCurve>();
        require_sync::<domain::EquityCurve>();

        require_send::<CointegrationResult>();
        require_sync::<CointegrationResult>();
        require_send::<HedgeRatio>();
        require_sync::<HedgeRatio>();
        require_send::<SpreadSignal>();
        require_sync::<SpreadSignal>();
        require_send::<SimulationResult>();
        require_sync::<SimulationResult>();
        require_send::<AnalysisError>();
        require_sync::<AnalysisError>();

        require_send::<StrategyParams>();
        require_sync::<StrategyParams>();
        require_send::<TradingSimulator>();
        require_sync::<TradingSimulator>();
    }
}
