//! TOML run configuration.
//!
//! ```toml
//! [data]
//! dir = "data"
//! benchmark = "SPY"
//! start = "2019-01-01"
//!
//! [[pairs]]
//! a = "KO"
//! b = "PEP"
//!
//! [strategy]
//! zscore_window = 60
//! entry_threshold = 2.0
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pairlab_core::{ParamError, StrategyParams};

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid strategy parameters: {0}")]
    Params(#[from] ParamError),
    #[error("no pairs configured")]
    NoPairs,
    #[error("pair {0}/{0} pairs a symbol with itself")]
    SelfPair(String),
    #[error("data range is empty: start {start} is after end {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where price data comes from and what it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// Directory holding `<SYMBOL>.csv` files.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    /// Index symbol for alpha. None disables benchmark metrics.
    #[serde(default)]
    pub benchmark: Option<String>,
    /// Inclusive date bounds applied after loading.
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            benchmark: None,
            start: None,
            end: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Candidate pair; `a` is the dependent leg of the hedge regression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairSpec {
    pub a: String,
    pub b: String,
}

impl PairSpec {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.a, self.b)
    }

    /// File-name stem for per-pair artifacts, e.g. `KO_PEP`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.a, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub pairs: Vec<PairSpec>,
    #[serde(default)]
    pub strategy: StrategyParams,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        if self.pairs.is_empty() {
            return Err(ConfigError::NoPairs);
        }
        if let Some(pair) = self.pairs.iter().find(|p| p.a == p.b) {
            return Err(ConfigError::SelfPair(pair.a.clone()));
        }
        if let (Some(start), Some(end)) = (self.data.start, self.data.end) {
            if start > end {
                return Err(ConfigError::EmptyRange { start, end });
            }
        }
        Ok(())
    }

    /// Every symbol the run needs, benchmark included, sorted and deduplicated.
    pub fn symbols(&self) -> Vec<String> {
        let mut set: BTreeSet<&str> = BTreeSet::new();
        for pair in &self.pairs {
            set.insert(&pair.a);
            set.insert(&pair.b);
        }
        if let Some(bench) = &self.data.benchmark {
            set.insert(bench);
        }
        set.into_iter().map(str::to_string).collect()
    }

    /// Deterministic BLAKE3 fingerprint of the full configuration.
    ///
    /// Any parameter change yields a different id, so results computed under
    /// one configuration are never mistaken for another's.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
