//! PairLab Runner — orchestration, metrics, ranking and export.
//!
//! This crate builds on `pairlab-core` to provide:
//! - TOML run configuration with a content-addressed run id
//! - CSV and synthetic data loading into a price store
//! - The per-pair pipeline and the parallel universe run
//! - Performance analysis against buy-and-hold and a benchmark
//! - A Sharpe leaderboard and JSON/CSV artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod leaderboard;
pub mod metrics;
pub mod runner;

pub use config::{ConfigError, DataConfig, PairSpec, RunConfig, RunId};
pub use data_loader::{load_universe, synthetic_universe, LoadError, LoadOptions, LoadedData};
pub use export::{load_artifacts, save_artifacts, RunReport};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use metrics::{PerformanceAnalyzer, PerformanceReport};
pub use runner::{
    load_and_run, run_pair, run_universe, screen_only, PairOutcome, PairResult, RunError,
    ScreenRow, SkipReason, SkippedPair, UniverseRun, SCHEMA_VERSION,
};
