//! Property-based tests for strategy, ledger and sweep invariants.

mod common;

use common::*;
use proptest::prelude::*;

use stratsweep::domain::order::ExposurePolicy;
use stratsweep::domain::portfolio::Portfolio;
use stratsweep::domain::simulator::{SimulationConfig, simulate};
use stratsweep::domain::strategy::{DecisionContext, Strategy as _, StrategyKind};
use stratsweep::domain::sweep::{SweepConfig, sweep};

fn closes_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0f64, min..max)
}

#[derive(Debug, Clone)]
enum LedgerOp {
    Buy(f64, f64),
    Sell(f64, f64),
    Liquidate(f64),
    Inject(f64),
}

fn ledger_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (0.0..50.0f64, 1.0..200.0f64).prop_map(|(q, p)| LedgerOp::Buy(q, p)),
        (0.0..50.0f64, 1.0..200.0f64).prop_map(|(q, p)| LedgerOp::Sell(q, p)),
        (1.0..200.0f64).prop_map(LedgerOp::Liquidate),
        (0.0..2_000.0f64).prop_map(LedgerOp::Inject),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn decisions_ignore_future_bars(
        closes in closes_strategy(2, 80),
        day_seed in any::<prop::sample::Index>(),
        cash in 0.0..10_000.0f64,
        contribution_day in any::<bool>(),
    ) {
        let series = series_from_closes(&closes);
        let day = day_seed.index(series.len());
        let ctx = DecisionContext { cash, monthly_cash: 1_000.0, contribution_day };

        let mut strategies = StrategyKind::builtin();
        strategies.push(StrategyKind::MovingAverageCrossover {
            short_window: 2,
            long_window: 5,
            sell_on_cross_below: true,
        });
        strategies.push(StrategyKind::BuyAndHold { reinvest_contributions: true });

        for strategy in &strategies {
            let full = strategy.decide(day, &series, &ctx);
            let truncated = strategy.decide(day, &series[..=day], &ctx);
            prop_assert_eq!(full, truncated, "{} looked ahead at day {}", strategy.name(), day);
        }
    }

    #[test]
    fn ledger_never_goes_negative(
        start_cash in 0.0..10_000.0f64,
        ops in prop::collection::vec(ledger_op(), 1..60),
    ) {
        let mut portfolio = Portfolio::new(start_cash);
        for op in ops {
            match op {
                LedgerOp::Buy(q, p) => { portfolio.buy(q, p); }
                LedgerOp::Sell(q, p) => { portfolio.sell(q, p); }
                LedgerOp::Liquidate(p) => { portfolio.liquidate(p); }
                LedgerOp::Inject(a) => portfolio.inject(a),
            }
            prop_assert!(portfolio.cash >= 0.0);
            prop_assert!(portfolio.owned_quantity >= 0.0);
        }
    }

    #[test]
    fn constant_price_hold_has_zero_profit(
        price in 0.5..1_000.0f64,
        len in 1usize..300,
        fraction in 0.01..1.0f64,
    ) {
        let series = flat_series(len, price);
        let config = SimulationConfig {
            monthly_cash: 0.0,
            exposure: ExposurePolicy::FixedFraction(fraction),
            ..SimulationConfig::default()
        };
        let strategy = StrategyKind::BuyAndHold { reinvest_contributions: false };
        let outcome = simulate(&series, &strategy, &config).unwrap();
        prop_assert_eq!(outcome.profit_percent, 0.0);
    }

    #[test]
    fn simulation_is_deterministic(closes in closes_strategy(1, 120)) {
        let series = series_from_closes(&closes);
        for strategy in StrategyKind::builtin() {
            let first = simulate(&series, &strategy, &SimulationConfig::default()).unwrap();
            let second = simulate(&series, &strategy, &SimulationConfig::default()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn parallel_sweep_is_bit_identical(closes in closes_strategy(12, 90)) {
        let series = series_from_closes(&closes);
        let strategy = StrategyKind::BuyTheDip { dip_threshold: 0.02, lookback: 4 };
        let simulation = SimulationConfig::default();

        let parallel = sweep(&series, &strategy, &simulation, &SweepConfig::default()).unwrap();
        let sequential = sweep(
            &series,
            &strategy,
            &simulation,
            &SweepConfig { parallel: false, ..SweepConfig::default() },
        )
        .unwrap();
        let again = sweep(&series, &strategy, &simulation, &SweepConfig::default()).unwrap();

        prop_assert_eq!(&parallel, &sequential);
        prop_assert_eq!(&parallel, &again);
        for w in &parallel.windows {
            prop_assert_eq!(w.runs, series.len() - w.window_length);
        }
    }
}
