//! Property tests for the performance metrics.

use chrono::NaiveDate;
use pairlab_core::domain::EquityCurve;
use pairlab_runner::metrics::{annualized_return, max_drawdown, sharpe_ratio, total_return};
use proptest::prelude::*;

fn curve(values: Vec<f64>) -> EquityCurve {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let dates = (0..values.len())
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    EquityCurve::new(dates, values)
}

fn positive_curve() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1_000.0..200_000.0_f64, 2..120)
}

proptest! {
    #[test]
    fn drawdown_is_a_fraction_at_or_below_zero(values in positive_curve()) {
        let dd = max_drawdown(&curve(values));
        prop_assert!(dd <= 0.0);
        prop_assert!(dd > -1.0);
    }

    #[test]
    fn total_return_matches_endpoints(values in positive_curve()) {
        let expected = values[values.len() - 1] / values[0] - 1.0;
        let got = total_return(&curve(values)).unwrap();
        prop_assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn annualized_return_sign_follows_total(values in positive_curve()) {
        let c = curve(values);
        let total = total_return(&c).unwrap();
        let annual = annualized_return(&c, 252).unwrap();
        prop_assert!(total.signum() == annual.signum() || total.abs() < 1e-12);
    }

    #[test]
    fn sharpe_is_scale_invariant(values in positive_curve(), scale in 0.1..10.0_f64) {
        let base = sharpe_ratio(&curve(values.clone()), 252);
        let scaled = sharpe_ratio(&curve(values.iter().map(|v| v * scale).collect()), 252);
        match (base, scaled) {
            (Ok(a), Ok(b)) => prop_assert!((a - b).abs() < 1e-6 * a.abs().max(1.0)),
            (Err(_), Err(_)) => {}
            (a, b) => prop_assert!(false, "definedness differs: {:?} vs {:?}", a, b),
        }
    }
}
