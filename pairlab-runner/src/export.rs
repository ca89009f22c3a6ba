//! Artifact export: JSON report plus per-pair CSVs.
//!
//! A run directory holds:
//! - `report.json`: the whole `UniverseRun` (config, run id, every outcome)
//!   and the leaderboard, tagged with `schema_version`
//! - `<A>_<B>_trades.csv`: one row per closed trade
//! - `<A>_<B>_equity.csv`: strategy, buy-and-hold and benchmark curves by date
//!
//! Reports with a newer schema version are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use pairlab_core::domain::Trade;

use crate::leaderboard::Leaderboard;
use crate::runner::{PairResult, UniverseRun, SCHEMA_VERSION};

/// Contents of `report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub run: UniverseRun,
    pub leaderboard: Leaderboard,
}

impl RunReport {
    pub fn new(run: UniverseRun) -> Self {
        let leaderboard = Leaderboard::from_run(&run);
        Self {
            schema_version: SCHEMA_VERSION,
            run,
            leaderboard,
        }
    }
}

pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize run report to JSON")
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize run report from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

/// Trade tape as CSV.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "direction",
        "entry_index",
        "entry_date",
        "entry_spread",
        "entry_zscore",
        "exit_index",
        "exit_date",
        "exit_spread",
        "exit_zscore",
        "exit_reason",
        "size_multiplier",
        "units",
        "gross_pnl",
        "cost",
        "pnl",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            &format!("{:?}", t.direction),
            &t.entry_index.to_string(),
            &t.entry_date.to_string(),
            &format!("{:.6}", t.entry_spread),
            &format!("{:.4}", t.entry_zscore),
            &t.exit_index.to_string(),
            &t.exit_date.to_string(),
            &format!("{:.6}", t.exit_spread),
            &t.exit_zscore.map(|z| format!("{z:.4}")).unwrap_or_default(),
            t.exit_reason.as_str(),
            &format!("{:.4}", t.size_multiplier),
            &format!("{:.6}", t.units),
            &format!("{:.2}", t.gross_pnl),
            &format!("{:.2}", t.cost),
            &format!("{:.2}", t.pnl),
            &t.bars_held().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Equity curves by date. The benchmark column is empty without a benchmark.
pub fn export_equity_csv(result: &PairResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "position", "equity", "buy_and_hold", "benchmark"])?;
    for (i, date) in result.equity.dates.iter().enumerate() {
        let benchmark = result
            .benchmark
            .as_ref()
            .and_then(|b| b.values.get(i))
            .map(|v| format!("{v:.2}"))
            .unwrap_or_default();
        let position = result
            .positions
            .get(i)
            .map(|p| format!("{p:?}"))
            .unwrap_or_default();
        let buy_and_hold = result
            .buy_and_hold
            .values
            .get(i)
            .map(|v| format!("{v:.2}"))
            .unwrap_or_default();
        wtr.write_record([
            &date.to_string(),
            &position,
            &format!("{:.2}", result.equity.values[i]),
            &buy_and_hold,
            &benchmark,
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Directory name for a run: `run_` plus the first 12 hex chars of its id.
pub fn run_dir_name(report: &RunReport) -> String {
    let id = &report.run.run_id;
    format!("run_{}", &id[..id.len().min(12)])
}

/// Write the full artifact set under `output_dir`. Returns the run directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(run_dir_name(report));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("report.json"), &json)
        .with_context(|| format!("failed to write {}", run_dir.join("report.json").display()))?;

    for result in report.run.completed() {
        let stem = result.pair.file_stem();

        let trades_path = run_dir.join(format!("{stem}_trades.csv"));
        std::fs::write(&trades_path, export_trades_csv(&result.trades)?)
            .with_context(|| format!("failed to write {}", trades_path.display()))?;

        let equity_path = run_dir.join(format!("{stem}_equity.csv"));
        std::fs::write(&equity_path, export_equity_csv(result)?)
            .with_context(|| format!("failed to write {}", equity_path.display()))?;
    }

    Ok(run_dir)
}

/// Load `report.json` from a run directory.
pub fn load_artifacts(dir: &Path) -> Result<RunReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
