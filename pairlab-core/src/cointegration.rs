//! Engle-Granger cointegration screening.
//!
//! # Procedure
//! ```text
//! 1. OLS:  A[t] = c + β·B[t] + u[t]
//! 2. ADF on u (no constant, AIC lag selection)
//! 3. p-value and critical values from MacKinnon surfaces (N = 2, constant)
//! ```
//!
//! The test is not symmetric: screening (A, B) and (B, A) gives different
//! statistics. Callers that care about leg order must screen both.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StrategyParams;
use crate::domain::PairCandidate;
use crate::error::AnalysisError;
use crate::stats::{
    adf_test, engle_granger_critical_values, engle_granger_p_value, simple_ols, CriticalValues,
};

/// Fits with R² at or above `1 - PERFECT_FIT_TOLERANCE` are treated as exact.
const PERFECT_FIT_TOLERANCE: f64 = 100.0 * 1.490_116_119_384_765_6e-8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CointegrationResult {
    /// ADF t-statistic on the residuals. `-inf` for an exact linear fit.
    #[serde(with = "extended_float")]
    pub statistic: f64,
    pub p_value: f64,
    pub is_cointegrated: bool,
    /// Threshold the decision was made against.
    pub p_threshold: f64,
    pub critical_values: CriticalValues,
    pub used_lag: usize,
    pub nobs: usize,
    /// R² of the cointegrating regression.
    pub r_squared: f64,
}

#[derive(Debug, Clone)]
pub struct CointegrationScreener {
    p_threshold: f64,
    min_observations: usize,
    max_lag: Option<usize>,
}

impl CointegrationScreener {
    pub fn new(p_threshold: f64, min_observations: usize) -> Self {
        Self {
            p_threshold,
            min_observations,
            max_lag: None,
        }
    }

    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = Some(max_lag);
        self
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        Self {
            p_threshold: params.cointegration_p_threshold,
            min_observations: params.min_observations,
            max_lag: params.adf_max_lag,
        }
    }

    pub fn p_threshold(&self) -> f64 {
        self.p_threshold
    }

    /// Test whether `a - β·b - c` is stationary.
    pub fn screen(&self, a: &[f64], b: &[f64]) -> Result<CointegrationResult, AnalysisError> {
        if a.len() != b.len() {
            return Err(AnalysisError::DataAlignment(format!(
                "cointegration legs differ in length ({} vs {})",
                a.len(),
                b.len()
            )));
        }
        let n = a.len();
        if n < self.min_observations {
            return Err(AnalysisError::insufficient(
                "cointegration test",
                self.min_observations,
                n,
            ));
        }

        let fit = simple_ols(a, b)?;
        let critical_values = engle_granger_critical_values(n - 1);

        if fit.r_squared >= 1.0 - PERFECT_FIT_TOLERANCE {
            debug!(r_squared = fit.r_squared, "exact linear fit, residuals are trivially stationary");
            return Ok(CointegrationResult {
                statistic: f64::NEG_INFINITY,
                p_value: 0.0,
                is_cointegrated: true,
                p_threshold: self.p_threshold,
                critical_values,
                used_lag: 0,
                nobs: n,
                r_squared: fit.r_squared,
            });
        }

        let adf = adf_test(&fit.residuals, self.max_lag)?;
        let p_value = engle_granger_p_value(adf.statistic);

        Ok(CointegrationResult {
            statistic: adf.statistic,
            p_value,
            is_cointegrated: p_value < self.p_threshold,
            p_threshold: self.p_threshold,
            critical_values,
            used_lag: adf.used_lag,
            nobs: adf.nobs,
            r_squared: fit.r_squared,
        })
    }

    pub fn screen_pair(&self, pair: &PairCandidate) -> Result<CointegrationResult, AnalysisError> {
        let result = self.screen(&pair.prices_a, &pair.prices_b)?;
        info!(
            pair = %pair.label(),
            statistic = result.statistic,
            p_value = result.p_value,
            cointegrated = result.is_cointegrated,
            "screened pair"
        );
        Ok(result)
    }
}

/// JSON has no infinities; non-finite values travel as "inf", "-inf" or "nan".
mod extended_float {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(t) => match t.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("invalid float '{other}'"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// B is a random walk, A = 2 + 1.5·B + AR(1) noise.
    fn cointegrated_legs(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut b = Vec::with_capacity(n);
        let mut a = Vec::with_capacity(n);
        let mut level = 50.0;
        let mut noise = 0.0;
        for _ in 0..n {
            level += rng.gen_range(-1.0..1.0);
            noise = 0.2 * noise + rng.gen_range(-0.5..0.5);
            b.push(level);
            a.push(2.0 + 1.5 * level + noise);
        }
        (a, b)
    }

    fn independent_walks(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut a, mut b) = (vec![100.0], vec![100.0]);
        for i in 1..n {
            a.push(a[i - 1] + rng.gen_range(-1.0..1.0));
            b.push(b[i - 1] + rng.gen_range(-1.0..1.0));
        }
        (a, b)
    }

    #[test]
    fn detects_cointegrated_pair() {
        let (a, b) = cointegrated_legs(300, 42);
        let res = CointegrationScreener::new(0.05, 30).screen(&a, &b).unwrap();
        assert!(res.is_cointegrated, "p = {}", res.p_value);
        assert!(res.statistic < res.critical_values.five_pct);
    }

    #[test]
    fn independent_walks_usually_rejected() {
        let screener = CointegrationScreener::new(0.05, 30);
        let accepted = (0..10)
            .filter(|seed| {
                let (a, b) = independent_walks(300, *seed);
                screener.screen(&a, &b).unwrap().is_cointegrated
            })
            .count();
        assert!(accepted <= 3, "{accepted} of 10 spurious pairs accepted");
    }

    #[test]
    fn threshold_is_configurable() {
        let (a, b) = independent_walks(200, 5);
        let strict = CointegrationScreener::new(0.01, 30).screen(&a, &b).unwrap();
        let loose = CointegrationScreener::new(0.999, 30).screen(&a, &b).unwrap();
        assert_eq!(strict.statistic, loose.statistic);
        assert_eq!(loose.is_cointegrated, loose.p_value < 0.999);
        assert_eq!(strict.is_cointegrated, strict.p_value < 0.01);
    }

    #[test]
    fn short_sample_is_insufficient() {
        let (a, b) = cointegrated_legs(20, 1);
        let err = CointegrationScreener::new(0.05, 30).screen(&a, &b).unwrap_err();
        assert_eq!(err, AnalysisError::insufficient("cointegration test", 30, 20));
    }

    #[test]
    fn mismatched_lengths_fail_alignment() {
        let err = CointegrationScreener::new(0.05, 3)
            .screen(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DataAlignment(_)));
    }

    #[test]
    fn constant_regressor_is_degenerate() {
        let a: Vec<f64> = (0..40).map(|i| 10.0 + i as f64).collect();
        let b = vec![25.0; 40];
        let err = CointegrationScreener::new(0.05, 30).screen(&a, &b).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateRegression { .. }));
    }

    #[test]
    fn exact_fit_reports_negative_infinity() {
        let b: Vec<f64> = (0..60).map(|i| 20.0 + (i as f64 * 0.3).sin() + i as f64 * 0.1).collect();
        let a: Vec<f64> = b.iter().map(|x| 3.0 + 2.0 * x).collect();
        let res = CointegrationScreener::new(0.05, 30).screen(&a, &b).unwrap();
        assert_eq!(res.statistic, f64::NEG_INFINITY);
        assert_eq!(res.p_value, 0.0);
        assert!(res.is_cointegrated);
    }

    #[test]
    fn from_params_reads_threshold_and_lag() {
        let params = StrategyParams {
            cointegration_p_threshold: 0.1,
            adf_max_lag: Some(0),
            ..Default::default()
        };
        let (a, b) = cointegrated_legs(100, 9);
        let res = CointegrationScreener::from_params(&params).screen(&a, &b).unwrap();
        assert_eq!(res.p_threshold, 0.1);
        assert_eq!(res.used_lag, 0);
        assert_eq!(res.nobs, 99);
    }

    #[test]
    fn exact_fit_statistic_serializes_as_text() {
        let b: Vec<f64> = (0..60).map(|i| 20.0 + (i as f64 * 0.3).sin()).collect();
        let a: Vec<f64> = b.iter().map(|x| 3.0 * x - 1.0).collect();
        let screener = CointegrationScreener::new(0.05, 30).with_max_lag(2);
        assert_eq!(screener.p_threshold(), 0.05);
        let res = screener.screen(&a, &b).unwrap();
        assert_eq!(res.statistic, f64::NEG_INFINITY);

        let json = serde_json::to_string(&res).unwrap();
        assert!(json.contains(r#""statistic":"-inf""#));
        let back: CointegrationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, res);
    }

    #[test]
    fn periodic_spread_screens_as_cointegrated() {
        // The spread repeats every four bars, so lag-augmented ADF designs
        // beyond one lag are collinear.
        let spread = [1.0, 0.5, -1.0, -0.5];
        let b: Vec<f64> = (0..120).map(|i| if i % 2 == 0 { 52.0 } else { 48.0 }).collect();
        let a: Vec<f64> = b.iter().enumerate().map(|(i, x)| 10.0 + x + spread[i % 4]).collect();
        let res = CointegrationScreener::new(0.05, 30).screen(&a, &b).unwrap();
        assert!(!res.statistic.is_nan());
        assert!(res.statistic < res.critical_values.one_pct, "got {}", res.statistic);
        assert!(res.is_cointegrated, "p = {}", res.p_value);
    }

    #[test]
    fn trending_leg_with_periodic_spread_is_screened() {
        let spread = [1.0, 0.5, -1.0, -0.5];
        let b: Vec<f64> = (0..120).map(|i| 20.0 + 0.1 * i as f64).collect();
        let a: Vec<f64> = b.iter().enumerate().map(|(i, x)| x + spread[i % 4]).collect();
        let res = CointegrationScreener::new(0.05, 30).screen(&a, &b).unwrap();
        assert!(!res.statistic.is_nan());
        assert!(res.used_lag > 0);
    }
}
