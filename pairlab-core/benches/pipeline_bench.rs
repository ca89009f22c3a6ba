//! Criterion benchmarks for the single-pair pipeline.
//!
//! Benchmarks:
//! 1. Cointegration screen (OLS + ADF lag search)
//! 2. Z-score construction (rolling vs full-sample)
//! 3. Simulation loop
//! 4. Full pipeline: screen → hedge → signal → simulate

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pairlab_core::domain::{GapPolicy, PairCandidate};
use pairlab_core::signal::zscores;
use pairlab_core::{
    CointegrationScreener, HedgeRatioEstimator, SpreadSignalBuilder, StrategyParams,
    TradingSimulator, ZScoreWindow,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_pair(n: usize) -> PairCandidate {
    let mut rng = StdRng::seed_from_u64(n as u64);
    let base_date = chrono::NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    let b: Vec<f64> = (0..n)
        .map(|i| 100.0 + (i as f64 * 0.01).sin() * 20.0 + i as f64 * 0.02)
        .collect();
    let a: Vec<f64> = b
        .iter()
        .enumerate()
        .map(|(i, pb)| {
            4.0 + 1.1 * pb + (i as f64 * 0.37).sin() * 1.5 + rng.gen_range(-0.5..0.5)
        })
        .collect();
    PairCandidate {
        symbol_a: "AAA".into(),
        symbol_b: "BBB".into(),
        dates: (0..n)
            .map(|i| base_date + chrono::Duration::days(i as i64))
            .collect(),
        prices_a: a,
        prices_b: b,
        gap_policy: GapPolicy::Drop,
    }
}

fn params() -> StrategyParams {
    StrategyParams {
        zscore_window: ZScoreWindow::Rolling(60),
        ..Default::default()
    }
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_screen(c: &mut Criterion) {
    let mut group = c.benchmark_group("cointegration_screen");
    let screener = CointegrationScreener::from_params(&params());
    for n in [252usize, 1260, 2520] {
        let pair = make_pair(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &pair, |b, p| {
            b.iter(|| screener.screen_pair(black_box(p)))
        });
    }
    group.finish();
}

fn bench_zscores(c: &mut Criterion) {
    let mut group = c.benchmark_group("zscores");
    let spread: Vec<f64> = (0..2520).map(|i| (i as f64 * 0.21).sin()).collect();
    for window in [ZScoreWindow::FullSample, ZScoreWindow::Rolling(20), ZScoreWindow::Rolling(120)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{window:?}")),
            &window,
            |b, w| b.iter(|| zscores(black_box(&spread), *w)),
        );
    }
    group.finish();
}

fn bench_simulation(c: &mut Criterion) {
    let params = params();
    let pair = make_pair(2520);
    let hedge = HedgeRatioEstimator::new(params.min_observations)
        .estimate(&pair)
        .unwrap();
    let signal = SpreadSignalBuilder::new(params.zscore_window)
        .build(&pair, &hedge)
        .unwrap();
    let simulator = TradingSimulator::from_params(&params);
    c.bench_function("simulate_2520_bars", |b| {
        b.iter(|| simulator.run(black_box(&signal)))
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let params = params();
    let pair = make_pair(1260);
    c.bench_function("pipeline_1260_bars", |b| {
        b.iter(|| {
            let p = black_box(&pair);
            let screen = CointegrationScreener::from_params(&params).screen_pair(p).unwrap();
            let hedge = HedgeRatioEstimator::new(params.min_observations)
                .estimate(p)
                .unwrap();
            let signal = SpreadSignalBuilder::new(params.zscore_window)
                .build(p, &hedge)
                .unwrap();
            let sim = TradingSimulator::from_params(&params).run(&signal).unwrap();
            (screen.p_value, sim.trades.len())
        })
    });
}

criterion_group!(
    benches,
    bench_screen,
    bench_zscores,
    bench_simulation,
    bench_full_pipeline
);
criterion_main!(benches);
