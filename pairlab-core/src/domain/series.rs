//! Price series, the in-memory store, and pair alignment.
//!
//! A `PriceSeries` is immutable once constructed. Non-finite or non-positive
//! prices are kept as recorded and treated as gaps when a pair is aligned, so
//! the gap policy is the only place missing data gets resolved.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// How gaps are resolved when two series are put on a shared index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapPolicy {
    /// Keep only dates where every series has a valid price.
    #[default]
    Drop,
    /// Use the union of dates, carrying each series' last valid price forward.
    ForwardFill,
}

/// Ordered closing prices for one asset. Dates are strictly increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        points: Vec<(NaiveDate, f64)>,
    ) -> Result<Self, AnalysisError> {
        let symbol = symbol.into();
        for w in points.windows(2) {
            if w[1].0 <= w[0].0 {
                return Err(AnalysisError::InvalidSeries {
                    symbol,
                    reason: format!("timestamps not strictly increasing at {}", w[1].0),
                });
            }
        }
        let (dates, prices) = points.into_iter().unzip();
        Ok(Self {
            symbol,
            dates,
            prices,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Valid (date, price) points, skipping gaps.
    pub fn valid_points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates
            .iter()
            .zip(self.prices.iter())
            .filter(|(_, p)| is_valid_price(**p))
            .map(|(d, p)| (*d, *p))
    }

    /// Restrict to an inclusive date range.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let (dates, prices) = self
            .dates
            .iter()
            .zip(self.prices.iter())
            .filter(|(d, _)| **d >= start && **d <= end)
            .map(|(d, p)| (*d, *p))
            .unzip();
        Self {
            symbol: self.symbol.clone(),
            dates,
            prices,
        }
    }
}

pub(crate) fn is_valid_price(p: f64) -> bool {
    p.is_finite() && p > 0.0
}

/// Two assets on an identical date index after gap resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairCandidate {
    pub symbol_a: String,
    pub symbol_b: String,
    pub dates: Vec<NaiveDate>,
    pub prices_a: Vec<f64>,
    pub prices_b: Vec<f64>,
    pub gap_policy: GapPolicy,
}

impl PairCandidate {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Label used in logs and artifact names, e.g. `KO/PEP`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.symbol_a, self.symbol_b)
    }

    /// Sub-window of the pair over a bar index range.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            symbol_a: self.symbol_a.clone(),
            symbol_b: self.symbol_b.clone(),
            dates: self.dates[range.clone()].to_vec(),
            prices_a: self.prices_a[range.clone()].to_vec(),
            prices_b: self.prices_b[range].to_vec(),
            gap_policy: self.gap_policy,
        }
    }

    /// Pair with the legs swapped (B regressed on A downstream).
    pub fn swapped(&self) -> Self {
        Self {
            symbol_a: self.symbol_b.clone(),
            symbol_b: self.symbol_a.clone(),
            dates: self.dates.clone(),
            prices_a: self.prices_b.clone(),
            prices_b: self.prices_a.clone(),
            gap_policy: self.gap_policy,
        }
    }
}

/// Align two series onto one index under `policy`.
pub fn align_pair(
    a: &PriceSeries,
    b: &PriceSeries,
    policy: GapPolicy,
) -> Result<PairCandidate, AnalysisError> {
    let mut merged: BTreeMap<NaiveDate, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for (date, price) in a.valid_points() {
        merged.entry(date).or_default().0 = Some(price);
    }
    for (date, price) in b.valid_points() {
        merged.entry(date).or_default().1 = Some(price);
    }

    let mut dates = Vec::with_capacity(merged.len());
    let mut prices_a = Vec::with_capacity(merged.len());
    let mut prices_b = Vec::with_capacity(merged.len());

    match policy {
        GapPolicy::Drop => {
            for (date, pair) in merged {
                if let (Some(pa), Some(pb)) = pair {
                    dates.push(date);
                    prices_a.push(pa);
                    prices_b.push(pb);
                }
            }
        }
        GapPolicy::ForwardFill => {
            let mut last_a = None;
            let mut last_b = None;
            for (date, (pa, pb)) in merged {
                last_a = pa.or(last_a);
                last_b = pb.or(last_b);
                // Leading dates before both legs have traded are dropped.
                if let (Some(fa), Some(fb)) = (last_a, last_b) {
                    dates.push(date);
                    prices_a.push(fa);
                    prices_b.push(fb);
                }
            }
        }
    }

    if dates.is_empty() {
        return Err(AnalysisError::DataAlignment(format!(
            "{} and {} share no valid timestamps",
            a.symbol(),
            b.symbol()
        )));
    }

    Ok(PairCandidate {
        symbol_a: a.symbol().to_string(),
        symbol_b: b.symbol().to_string(),
        dates,
        prices_a,
        prices_b,
        gap_policy: policy,
    })
}

/// Project `series` onto an existing date index (e.g. a benchmark onto a pair).
///
/// Under `Drop` every target date must have a valid price. Under `ForwardFill`
/// a date before the series' first valid observation is an error.
pub fn align_to_index(
    series: &PriceSeries,
    index: &[NaiveDate],
    policy: GapPolicy,
) -> Result<Vec<f64>, AnalysisError> {
    let points: Vec<(NaiveDate, f64)> = series.valid_points().collect();
    let mut out = Vec::with_capacity(index.len());
    let mut cursor = 0;
    let mut last: Option<f64> = None;

    for date in index {
        while cursor < points.len() && points[cursor].0 <= *date {
            last = Some(points[cursor].1);
            cursor += 1;
        }
        let exact = cursor > 0 && points[cursor - 1].0 == *date;
        let value = match policy {
            GapPolicy::Drop if exact => last,
            GapPolicy::Drop => None,
            GapPolicy::ForwardFill => last,
        };
        match value {
            Some(v) => out.push(v),
            None => {
                return Err(AnalysisError::DataAlignment(format!(
                    "{} has no price for {date}",
                    series.symbol()
                )))
            }
        }
    }
    Ok(out)
}

/// In-memory holder for every candidate asset plus the benchmark.
#[derive(Debug, Clone, Default)]
pub struct PriceSeriesStore {
    series: HashMap<String, PriceSeries>,
}

impl PriceSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an identifier → (date, close) mapping.
    pub fn from_points(
        input: HashMap<String, Vec<(NaiveDate, f64)>>,
    ) -> Result<Self, AnalysisError> {
        let mut store = Self::new();
        for (symbol, points) in input {
            store.insert(PriceSeries::new(symbol, points)?);
        }
        Ok(store)
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(symbol)
    }

    /// Symbols in sorted order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut s: Vec<&str> = self.series.keys().map(|k| k.as_str()).collect();
        s.sort_unstable();
        s
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Look up and align a pair.
    pub fn pair(&self, a: &str, b: &str, policy: GapPolicy) -> Result<PairCandidate, AnalysisError> {
        let sa = self.lookup(a)?;
        let sb = self.lookup(b)?;
        align_pair(sa, sb, policy)
    }

    /// Benchmark prices projected onto `index`.
    pub fn aligned_to(
        &self,
        symbol: &str,
        index: &[NaiveDate],
        policy: GapPolicy,
    ) -> Result<Vec<f64>, AnalysisError> {
        align_to_index(self.lookup(symbol)?, index, policy)
    }

    fn lookup(&self, symbol: &str) -> Result<&PriceSeries, AnalysisError> {
        self.series
            .get(symbol)
            .ok_or_else(|| AnalysisError::DataAlignment(format!("no series loaded for '{symbol}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(symbol: &str, points: &[(u32, f64)]) -> PriceSeries {
        PriceSeries::new(symbol, points.iter().map(|(day, p)| (d(*day), *p)).collect()).unwrap()
    }

    #[test]
    fn rejects_non_increasing_timestamps() {
        let err = PriceSeries::new("KO", vec![(d(3), 1.0), (d(2), 1.0)]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidSeries { .. }));
        let err = PriceSeries::new("KO", vec![(d(2), 1.0), (d(2), 1.0)]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidSeries { .. }));
    }

    #[test]
    fn drop_policy_keeps_intersection() {
        let a = series("A", &[(2, 10.0), (3, 11.0), (4, 12.0), (5, 13.0)]);
        let b = series("B", &[(2, 20.0), (4, 22.0), (5, f64::NAN)]);
        let pair = align_pair(&a, &b, GapPolicy::Drop).unwrap();
        assert_eq!(pair.dates, vec![d(2), d(4)]);
        assert_eq!(pair.prices_a, vec![10.0, 12.0]);
        assert_eq!(pair.prices_b, vec![20.0, 22.0]);
    }

    #[test]
    fn forward_fill_uses_union_after_both_start() {
        let a = series("A", &[(1, 9.0), (2, 10.0), (3, 11.0), (5, 13.0)]);
        let b = series("B", &[(2, 20.0), (4, 22.0), (5, -1.0)]);
        let pair = align_pair(&a, &b, GapPolicy::ForwardFill).unwrap();
        // Day 1 dropped: B has not traded yet.
        assert_eq!(pair.dates, vec![d(2), d(3), d(4), d(5)]);
        assert_eq!(pair.prices_a, vec![10.0, 11.0, 11.0, 13.0]);
        assert_eq!(pair.prices_b, vec![20.0, 20.0, 22.0, 22.0]);
    }

    #[test]
    fn disjoint_series_fail_alignment() {
        let a = series("A", &[(2, 10.0)]);
        let b = series("B", &[(3, 20.0)]);
        let err = align_pair(&a, &b, GapPolicy::Drop).unwrap_err();
        assert!(matches!(err, AnalysisError::DataAlignment(_)));
    }

    #[test]
    fn benchmark_alignment_drop_requires_every_date() {
        let bench = series("SPY", &[(2, 400.0), (4, 404.0)]);
        let ok = align_to_index(&bench, &[d(2), d(4)], GapPolicy::Drop).unwrap();
        assert_eq!(ok, vec![400.0, 404.0]);
        let err = align_to_index(&bench, &[d(2), d(3)], GapPolicy::Drop).unwrap_err();
        assert!(matches!(err, AnalysisError::DataAlignment(_)));
    }

    #[test]
    fn benchmark_alignment_forward_fill() {
        let bench = series("SPY", &[(2, 400.0), (4, 404.0)]);
        let filled = align_to_index(&bench, &[d(2), d(3), d(5)], GapPolicy::ForwardFill).unwrap();
        assert_eq!(filled, vec![400.0, 400.0, 404.0]);
        let err = align_to_index(&bench, &[d(1)], GapPolicy::ForwardFill).unwrap_err();
        assert!(matches!(err, AnalysisError::DataAlignment(_)));
    }

    #[test]
    fn store_pair_lookup() {
        let mut store = PriceSeriesStore::new();
        store.insert(series("A", &[(2, 10.0), (3, 11.0)]));
        store.insert(series("B", &[(2, 20.0), (3, 21.0)]));
        assert_eq!(store.symbols(), vec!["A", "B"]);
        let pair = store.pair("A", "B", GapPolicy::Drop).unwrap();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair.label(), "A/B");
        assert!(store.pair("A", "MISSING", GapPolicy::Drop).is_err());
    }

    #[test]
    fn store_from_points_validates_each_series() {
        let mut input = HashMap::new();
        input.insert("A".to_string(), vec![(d(2), 10.0), (d(3), f64::NAN)]);
        let store = PriceSeriesStore::from_points(input).unwrap();
        assert!(store.contains("A"));
        assert!(!store.contains("B"));
        assert_eq!(store.get("A").unwrap().valid_points().count(), 1);

        let mut bad = HashMap::new();
        bad.insert("B".to_string(), vec![(d(3), 1.0), (d(2), 1.0)]);
        assert!(matches!(
            PriceSeriesStore::from_points(bad),
            Err(AnalysisError::InvalidSeries { .. })
        ));
    }

    #[test]
    fn slice_and_swap() {
        let a = series("A", &[(2, 10.0), (3, 11.0), (4, 12.0)]);
        let b = series("B", &[(2, 20.0), (3, 21.0), (4, 22.0)]);
        let pair = align_pair(&a, &b, GapPolicy::Drop).unwrap();
        let head = pair.slice(0..2);
        assert_eq!(head.prices_a, vec![10.0, 11.0]);
        let swapped = pair.swapped();
        assert_eq!(swapped.symbol_a, "B");
        assert_eq!(swapped.prices_a, pair.prices_b);
    }
}
