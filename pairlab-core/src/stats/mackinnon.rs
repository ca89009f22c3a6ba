//! MacKinnon response surfaces for the two-variable Engle-Granger test with a
//! constant in the cointegrating regression.
//!
//! p-values: MacKinnon (1994) approximate asymptotic distribution.
//! Critical values: MacKinnon (2010) finite-sample surfaces.

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

/// Above this the p-value is 1.
const TAU_MAX: f64 = 0.92;
/// Below this the p-value is 0.
const TAU_MIN: f64 = -18.86;
/// Switch point between the small-p and large-p polynomials.
const TAU_STAR: f64 = -2.62;

const TAU_SMALL_P: [f64; 3] = [2.92, 1.5012, 0.039796];
const TAU_LARGE_P: [f64; 4] = [2.1945, 0.64695, -0.29198, -0.042377];

/// (β∞, β1, β2) per significance level: crit = β∞ + β1/T + β2/T².
const CRIT_1PCT: [f64; 3] = [-3.89644, -10.9519, -33.527];
const CRIT_5PCT: [f64; 3] = [-3.33613, -6.1101, -6.823];
const CRIT_10PCT: [f64; 3] = [-3.04445, -4.2412, -2.720];

/// Approximate p-value of an Engle-Granger ADF statistic.
pub fn engle_granger_p_value(statistic: f64) -> f64 {
    if statistic.is_nan() {
        return 1.0;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let z = if statistic <= TAU_STAR {
        polyval(&TAU_SMALL_P, statistic)
    } else {
        polyval(&TAU_LARGE_P, statistic)
    };
    standard_normal_cdf(z)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

/// Finite-sample critical values for `nobs` observations.
pub fn engle_granger_critical_values(nobs: usize) -> CriticalValues {
    let t = nobs.max(1) as f64;
    let surface = |b: [f64; 3]| b[0] + b[1] / t + b[2] / (t * t);
    CriticalValues {
        one_pct: surface(CRIT_1PCT),
        five_pct: surface(CRIT_5PCT),
        ten_pct: surface(CRIT_10PCT),
    }
}

/// c[0] + c[1]·x + c[2]·x² + …
fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}
