//! Pair leaderboard: completed pairs ranked by Sharpe ratio.
//!
//! Pairs with an undefined Sharpe (flat equity, too few returns) rank after
//! every defined one. Ties, and order among undefined entries, fall back to the
//! pair label so rankings are stable across runs.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use pairlab_core::domain::Reading;

use crate::config::PairSpec;
use crate::runner::{PairResult, UniverseRun};

/// A single ranked row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub pair: PairSpec,
    pub sharpe: Reading,
    pub total_return: Reading,
    pub max_drawdown: f64,
    pub trade_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn from_run(run: &UniverseRun) -> Self {
        Self::from_results(run.completed())
    }

    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a PairResult>) -> Self {
        let mut entries: Vec<LeaderboardEntry> = results
            .into_iter()
            .map(|r| LeaderboardEntry {
                rank: 0,
                pair: r.pair.clone(),
                sharpe: r.report.sharpe,
                total_return: r.report.total_return,
                max_drawdown: r.report.max_drawdown,
                trade_count: r.report.trade_count,
            })
            .collect();
        entries.sort_by(|a, b| {
            compare_sharpe(a.sharpe, b.sharpe).then_with(|| a.pair.label().cmp(&b.pair.label()))
        });
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Highest defined Sharpe. None when no completed pair has one.
    pub fn best(&self) -> Option<&LeaderboardEntry> {
        self.entries.first().filter(|e| e.sharpe.is_defined())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Descending by value; undefined sorts last.
fn compare_sharpe(a: Reading, b: Reading) -> Ordering {
    match (a.value(), b.value()) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
