//! Price loading for the runner.
//!
//! Two sources:
//! 1. Per-symbol CSV files `<dir>/<SYMBOL>.csv` with a date column and a close
//!    column (adjusted close preferred)
//! 2. `--synthetic`: a deterministic generated universe for offline runs
//!
//! Synthetic data is a developer-only debug mode. Results produced on it are
//! tagged `has_synthetic`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{debug, warn};

use pairlab_core::domain::{PriceSeries, PriceSeriesStore};
use pairlab_core::AnalysisError;

use crate::config::RunConfig;

const DATE_COLUMNS: [&str; 4] = ["date", "Date", "DATE", "timestamp"];
const CLOSE_COLUMNS: [&str; 5] = ["adj_close", "Adj Close", "adjclose", "close", "Close"];

/// Synthetic data bounds when the config does not set any.
const SYNTHETIC_START: (i32, u32, u32) = (2019, 1, 2);
const SYNTHETIC_END: (i32, u32, u32) = (2023, 12, 29);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file for '{symbol}' at {path} (use --synthetic for synthetic data)")]
    MissingFile { symbol: String, path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{path}: no {kind} column (expected one of {expected})")]
    MissingColumn {
        path: PathBuf,
        kind: &'static str,
        expected: String,
    },

    #[error("{path}: row {row}: unparseable date '{value}'")]
    BadDate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("series error: {0}")]
    Series(#[from] AnalysisError),
}

/// Options controlling how prices are loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Generate synthetic prices instead of reading files.
    pub synthetic: bool,
}

/// Loaded prices plus provenance.
#[derive(Debug)]
pub struct LoadedData {
    pub store: PriceSeriesStore,
    /// BLAKE3 over every loaded (symbol, date, price), in symbol order.
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

/// Load every symbol the config references.
pub fn load_universe(config: &RunConfig, opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let symbols = config.symbols();
    let start = config.data.start;
    let end = config.data.end;

    let mut store = PriceSeriesStore::new();
    if opts.synthetic {
        warn!("generating synthetic data, results will be tagged as synthetic");
        let start = start.unwrap_or_else(|| ymd(SYNTHETIC_START));
        let end = end.unwrap_or_else(|| ymd(SYNTHETIC_END));
        for series in synthetic_universe(&symbols, start, end)? {
            store.insert(series);
        }
    } else {
        for symbol in &symbols {
            let path = config.data.dir.join(format!("{symbol}.csv"));
            if !path.exists() {
                return Err(LoadError::MissingFile {
                    symbol: symbol.clone(),
                    path,
                });
            }
            let series = load_csv(&path, symbol)?;
            let series = match (start, end) {
                (None, None) => series,
                (s, e) => series.between(s.unwrap_or(NaiveDate::MIN), e.unwrap_or(NaiveDate::MAX)),
            };
            debug!(symbol = %symbol, bars = series.len(), "loaded series");
            store.insert(series);
        }
    }

    let dataset_hash = compute_dataset_hash(&store);
    Ok(LoadedData {
        store,
        dataset_hash,
        has_synthetic: opts.synthetic,
    })
}

/// Read one symbol's closes from a CSV file.
///
/// Rows are sorted by date. Empty or non-numeric prices become NaN, which the
/// pair alignment treats as gaps.
pub fn load_csv(path: &Path, symbol: &str) -> Result<PriceSeries, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();

    let find = |candidates: &[&str], kind: &'static str| {
        candidates
            .iter()
            .find_map(|name| headers.iter().position(|h| h == *name))
            .ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                kind,
                expected: candidates.join(", "),
            })
    };
    let date_idx = find(&DATE_COLUMNS[..], "date")?;
    let close_idx = find(&CLOSE_COLUMNS[..], "close")?;

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = parse_date(raw_date).ok_or_else(|| LoadError::BadDate {
            path: path.to_path_buf(),
            row: row + 1,
            value: raw_date.to_string(),
        })?;
        let price = record
            .get(close_idx)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(f64::NAN);
        points.push((date, price));
    }
    points.sort_by_key(|(d, _)| *d);

    Ok(PriceSeries::new(symbol, points)?)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Compute a deterministic BLAKE3 hash over all loaded prices.
fn compute_dataset_hash(store: &PriceSeriesStore) -> String {
    let mut hasher = blake3::Hasher::new();
    for symbol in store.symbols() {
        hasher.update(symbol.as_bytes());
        if let Some(series) = store.get(symbol) {
            for (date, price) in series.dates().iter().zip(series.prices()) {
                hasher.update(date.to_string().as_bytes());
                hasher.update(&price.to_le_bytes());
            }
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate a synthetic universe on weekdays between `start` and `end`.
///
/// Every symbol loads on one common random-walk factor:
/// ```text
/// price = base + loading · factor + ou_noise (+ idiosyncratic walk)
/// ```
/// Symbols whose seed selects an idiosyncratic walk drift away from the
/// factor and should fail a cointegration screen; the rest share it and
/// should pass. Seeds come from BLAKE3 of the symbol name, so each symbol's
/// path is reproducible regardless of what else is in the universe.
pub fn synthetic_universe(
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PriceSeries>, AnalysisError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let dates = weekdays(start, end);

    let mut factor_rng = StdRng::from_seed(*blake3::hash(b"pairlab:common-factor").as_bytes());
    let mut level = 100.0_f64;
    let factor: Vec<f64> = dates
        .iter()
        .map(|_| {
            level += factor_rng.gen_range(-1.0..1.0);
            level
        })
        .collect();

    symbols
        .iter()
        .map(|symbol| {
            let seed = *blake3::hash(symbol.as_bytes()).as_bytes();
            let mut rng = StdRng::from_seed(seed);
            let base = rng.gen_range(10.0..60.0);
            let loading = rng.gen_range(0.5..1.5);
            let drifts = seed[0] % 3 == 0;

            let mut noise = 0.0_f64;
            let mut walk = 0.0_f64;
            let points = dates
                .iter()
                .zip(&factor)
                .map(|(date, f)| {
                    noise = 0.85 * noise + rng.gen_range(-0.8..0.8);
                    if drifts {
                        walk += rng.gen_range(-1.2..1.2);
                    }
                    let price = (base + loading * f + noise + walk).max(1.0);
                    (*date, price)
                })
                .collect();
            PriceSeries::new(symbol.as_str(), points)
        })
        .collect()
}

fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun))
        .collect()
}

/// Group pre-built series into a store (used by tests and embedders).
pub fn store_from_series(series: Vec<PriceSeries>) -> PriceSeriesStore {
    let mut store = PriceSeriesStore::new();
    for s in series {
        store.insert(s);
    }
    store
}

/// Per-symbol bar counts, for summaries.
pub fn bar_counts(store: &PriceSeriesStore) -> HashMap<String, usize> {
    store
        .symbols()
        .into_iter()
        .filter_map(|s| store.get(s).map(|series| (s.to_string(), series.len())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PairSpec;
    use std::io::Write;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write_csv(dir: &Path, symbol: &str, body: &str) {
        let mut f = std::fs::File::create(dir.join(format!("{symbol}.csv"))).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    fn config(dir: &Path, pairs: &[(&str, &str)], benchmark: Option<&str>) -> RunConfig {
        RunConfig {
            data: crate::config::DataConfig {
                dir: dir.to_path_buf(),
                benchmark: benchmark.map(str::to_string),
                start: None,
                end: None,
            },
            pairs: pairs.iter().map(|(a, b)| PairSpec::new(*a, *b)).collect(),
            strategy: Default::default(),
        }
    }

    #[test]
    fn loads_csv_with_adjusted_close() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "KO",
            "Date,Open,Close,Adj Close\n2024-01-03,60,61,60.5\n2024-01-02,59,60,59.5\n",
        );
        let series = load_csv(&dir.path().join("KO.csv"), "KO").unwrap();
        assert_eq!(series.dates(), &[d(2024, 1, 2), d(2024, 1, 3)]);
        assert_eq!(series.prices(), &[59.5, 60.5]);
    }

    #[test]
    fn blank_price_becomes_gap() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "X", "date,close\n2024-01-02,10\n2024-01-03,\n2024-01-04,11\n");
        let series = load_csv(&dir.path().join("X.csv"), "X").unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.prices()[1].is_nan());
        assert_eq!(series.valid_points().count(), 2);
    }

    #[test]
    fn datetime_dates_are_truncated() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "X", "date,close\n2024-01-02 00:00:00,10\n");
        let series = load_csv(&dir.path().join("X.csv"), "X").unwrap();
        assert_eq!(series.dates(), &[d(2024, 1, 2)]);
    }

    #[test]
    fn missing_close_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "X", "date,open\n2024-01-02,10\n");
        let err = load_csv(&dir.path().join("X.csv"), "X").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { kind: "close", .. }));
    }

    #[test]
    fn bad_date_is_reported_with_row() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "X", "date,close\n2024-01-02,10\nyesterday,11\n");
        let err = load_csv(&dir.path().join("X.csv"), "X").unwrap_err();
        assert!(matches!(err, LoadError::BadDate { row: 2, .. }));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "X", "date,close\n2024-01-02,10\n2024-01-02,11\n");
        let err = load_csv(&dir.path().join("X.csv"), "X").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Series(AnalysisError::InvalidSeries { .. })
        ));
    }

    #[test]
    fn load_universe_reads_every_symbol() {
        let dir = tempfile::tempdir().unwrap();
        for sym in ["A", "B", "IDX"] {
            write_csv(dir.path(), sym, "date,close\n2024-01-02,10\n2024-01-03,11\n");
        }
        let cfg = config(dir.path(), &[("A", "B")], Some("IDX"));
        let loaded = load_universe(&cfg, &LoadOptions::default()).unwrap();
        assert_eq!(loaded.store.symbols(), vec!["A", "B", "IDX"]);
        assert!(!loaded.has_synthetic);
        assert_eq!(bar_counts(&loaded.store)["IDX"], 2);
    }

    #[test]
    fn missing_file_without_synthetic_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), &[("A", "B")], None);
        let err = load_universe(&cfg, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingFile { symbol, .. } if symbol == "A"));
    }

    #[test]
    fn date_bounds_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        for sym in ["A", "B"] {
            write_csv(
                dir.path(),
                sym,
                "date,close\n2024-01-02,10\n2024-01-03,11\n2024-01-04,12\n",
            );
        }
        let mut cfg = config(dir.path(), &[("A", "B")], None);
        cfg.data.start = Some(d(2024, 1, 3));
        let loaded = load_universe(&cfg, &LoadOptions::default()).unwrap();
        assert_eq!(loaded.store.get("A").unwrap().len(), 2);
    }

    #[test]
    fn synthetic_data_is_deterministic() {
        let symbols = vec!["AAA".to_string(), "BBB".to_string()];
        let a = synthetic_universe(&symbols, d(2022, 1, 3), d(2022, 12, 30)).unwrap();
        let b = synthetic_universe(&symbols, d(2022, 1, 3), d(2022, 12, 30)).unwrap();
        assert_eq!(a[0].prices(), b[0].prices());
        assert_ne!(a[0].prices(), a[1].prices());
        assert!(a[0].dates().iter().all(|d| d.weekday().number_from_monday() <= 5));
    }

    #[test]
    fn synthetic_symbol_path_independent_of_universe() {
        let one = synthetic_universe(&["AAA".to_string()], d(2022, 1, 3), d(2022, 6, 30)).unwrap();
        let two = synthetic_universe(
            &["ZZZ".to_string(), "AAA".to_string()],
            d(2022, 1, 3),
            d(2022, 6, 30),
        )
        .unwrap();
        assert_eq!(one[0].prices(), two[1].prices());
    }

    #[test]
    fn synthetic_load_is_tagged_and_hashed() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), &[("AAA", "BBB")], None);
        let opts = LoadOptions { synthetic: true };
        let first = load_universe(&cfg, &opts).unwrap();
        let second = load_universe(&cfg, &opts).unwrap();
        assert!(first.has_synthetic);
        assert_eq!(first.dataset_hash, second.dataset_hash);
        assert_eq!(first.dataset_hash.len(), 64);
    }
}
