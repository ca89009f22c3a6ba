use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Account value per bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl EquityCurve {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn initial(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Simple per-bar returns; one shorter than the curve.
    pub fn returns(&self) -> Vec<f64> {
        self.values
            .windows(2)
            .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
            .collect()
    }

    /// Hold `prices` from the first bar with `capital` invested.
    pub fn from_prices(dates: &[NaiveDate], prices: &[f64], capital: f64) -> Self {
        let values = match prices.first() {
            Some(&p0) if p0 > 0.0 => prices.iter().map(|p| capital * p / p0).collect(),
            _ => vec![capital; prices.len()],
        };
        Self::new(dates.to_vec(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
    }

    #[test]
    fn returns_are_simple() {
        let curve = EquityCurve::new(dates(3), vec![100.0, 110.0, 99.0]);
        let r = curve.returns();
        assert!((r[0] - 0.10).abs() < 1e-12);
        assert!((r[1] + 0.10).abs() < 1e-12);
        assert_eq!(curve.initial(), Some(100.0));
        assert_eq!(curve.final_value(), Some(99.0));
    }

    #[test]
    fn from_prices_scales_to_capital() {
        let curve = EquityCurve::from_prices(&dates(3), &[50.0, 55.0, 45.0], 1_000.0);
        assert_eq!(curve.values, vec![1_000.0, 1_100.0, 900.0]);
    }
}
