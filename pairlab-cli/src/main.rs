//! PairLab CLI — run and screen commands.
//!
//! Commands:
//! - `run`: screen, simulate and score every configured pair, print a summary
//!   table and the best pair, and save artifacts
//! - `screen`: print the cointegration screen and hedge ratio per pair only

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use pairlab_core::domain::Reading;
use pairlab_runner::data_loader::bar_counts;
use pairlab_runner::{
    load_universe, run_universe, save_artifacts, screen_only, Leaderboard, LoadOptions,
    LoadedData, PairOutcome, RunConfig, RunReport, UniverseRun,
};

#[derive(Parser)]
#[command(
    name = "pairlab",
    about = "PairLab CLI — cointegration pairs-trading backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest every pair in a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Use a generated universe instead of CSV files.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Output directory for report.json and per-pair CSVs.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Print the cointegration screen for every configured pair.
    Screen {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Use a generated universe instead of CSV files.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            synthetic,
            output_dir,
        } => run_cmd(config, synthetic, output_dir),
        Commands::Screen { config, synthetic } => screen_cmd(config, synthetic),
    }
}

fn load_config(path: &Path) -> Result<RunConfig> {
    RunConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))
}

fn print_universe(data: &LoadedData) {
    let mut counts: Vec<(String, usize)> = bar_counts(&data.store).into_iter().collect();
    counts.sort();
    let listing: Vec<String> = counts.iter().map(|(s, n)| format!("{s} ({n})")).collect();
    println!("Loaded {} symbols: {}", counts.len(), listing.join(", "));
}

fn run_cmd(config_path: PathBuf, synthetic: bool, output_dir: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let data = load_universe(&config, &LoadOptions { synthetic })?;
    print_universe(&data);
    let run = run_universe(&config, &data)?;

    if run.completed().next().is_none() {
        print_outcomes(&run);
        bail!("no pair completed; nothing to report");
    }

    let report = RunReport::new(run);
    print_outcomes(&report.run);
    print_best(&report.leaderboard);

    let run_dir = save_artifacts(&report, &output_dir)?;
    info!(dir = %run_dir.display(), "artifacts saved");
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn screen_cmd(config_path: PathBuf, synthetic: bool) -> Result<()> {
    let config = load_config(&config_path)?;
    let data = load_universe(&config, &LoadOptions { synthetic })?;
    print_universe(&data);

    println!(
        "{:<14} {:>9} {:>8} {:>8} {:>8} {:>8} {:>4} {:>9} {:>9}  {}",
        "Pair", "ADF stat", "p-value", "1%", "5%", "10%", "lag", "beta", "alpha", "Verdict"
    );
    println!("{}", "-".repeat(100));
    for spec in &config.pairs {
        match screen_only(&data.store, spec, &config.strategy) {
            Ok(row) => {
                let cv = &row.screen.critical_values;
                println!(
                    "{:<14} {:>9.3} {:>8.4} {:>8.3} {:>8.3} {:>8.3} {:>4} {:>9.4} {:>9.4}  {}",
                    spec.label(),
                    row.screen.statistic,
                    row.screen.p_value,
                    cv.one_pct,
                    cv.five_pct,
                    cv.ten_pct,
                    row.screen.used_lag,
                    row.hedge.slope,
                    row.hedge.intercept,
                    if row.screen.is_cointegrated {
                        "cointegrated"
                    } else {
                        "not cointegrated"
                    }
                );
            }
            Err(e) => println!("{:<14} skipped: {e}", spec.label()),
        }
    }
    if data.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    Ok(())
}

fn print_outcomes(run: &UniverseRun) {
    println!();
    println!("=== PairLab Run {} ===", &run.run_id[..run.run_id.len().min(12)]);
    println!(
        "{:<14} {:>6} {:>9} {:>9} {:>8} {:>8} {:>9} {:>9} {:>9}",
        "Pair", "Trades", "Return", "Ann.Ret", "Sharpe", "MaxDD", "Win Rate", "Alpha", "B&H"
    );
    println!("{}", "-".repeat(90));
    for outcome in &run.outcomes {
        match outcome {
            PairOutcome::Completed(r) => {
                let m = &r.report;
                println!(
                    "{:<14} {:>6} {:>9} {:>9} {:>8} {:>7.2}% {:>9} {:>9} {:>9}",
                    r.pair.label(),
                    m.trade_count,
                    pct(m.total_return),
                    pct(m.annualized_return),
                    num(m.sharpe),
                    m.max_drawdown * 100.0,
                    pct(m.win_rate),
                    pct(m.annualized_alpha),
                    pct(m.buy_and_hold_return),
                );
                if r.uses_future_data {
                    println!("{:<14} note: z-scores use full-sample statistics (look-ahead)", "");
                }
            }
            PairOutcome::Skipped(s) => {
                println!("{:<14} skipped ({}): {}", s.pair.label(), s.reason.as_str(), s.detail);
            }
        }
    }
    if run.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}

fn print_best(board: &Leaderboard) {
    println!();
    match board.best() {
        Some(best) => println!(
            "Best pair: {} (Sharpe {}, return {})",
            best.pair.label(),
            num(best.sharpe),
            pct(best.total_return)
        ),
        None => println!("Best pair: none (no completed pair has a defined Sharpe)"),
    }
}

fn pct(r: Reading) -> String {
    match r.value() {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "n/a".to_string(),
    }
}

fn num(r: Reading) -> String {
    match r.value() {
        Some(v) => format!("{v:.3}"),
        None => "n/a".to_string(),
    }
}
