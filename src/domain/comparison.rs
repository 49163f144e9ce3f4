//! Side-by-side single runs of several strategies over the same window.

use tracing::info;

use super::error::StratsweepError;
use super::price::{PriceBar, validate_series};
use super::simulator::{RunOutcome, SimulationConfig, run_validated};
use super::strategy::{Strategy, StrategyKind};

/// Trading days in the default comparison window (about one year).
pub const DEFAULT_COMPARISON_ROWS: usize = 252;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRun {
    pub name: String,
    pub label: String,
    pub outcome: RunOutcome,
}

/// Run every strategy once over `series`, recording daily portfolio history.
pub fn compare_strategies(
    series: &[PriceBar],
    strategies: &[StrategyKind],
    simulation: &SimulationConfig,
) -> Result<Vec<StrategyRun>, StratsweepError> {
    simulation.validate()?;
    validate_series(series)?;

    let runs = strategies
        .iter()
        .map(|strategy| {
            let outcome = run_validated(series, strategy, simulation, true);
            info!(
                strategy = strategy.name(),
                profit_percent = outcome.profit_percent,
                "comparison run"
            );
            StrategyRun {
                name: strategy.name().to_string(),
                label: strategy.label(),
                outcome,
            }
        })
        .collect();
    Ok(runs)
}

/// Run with the highest profit percent.
pub fn leader(runs: &[StrategyRun]) -> Option<&StrategyRun> {
    runs.iter().max_by(|a, b| {
        a.outcome
            .profit_percent
            .total_cmp(&b.outcome.profit_percent)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::ExposurePolicy;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0,
            })
            .collect()
    }

    #[test]
    fn every_strategy_reported_in_order() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i % 7) as f64).collect();
        let bars = series(&closes);
        let strategies = StrategyKind::builtin();
        let runs = compare_strategies(&bars, &strategies, &SimulationConfig::default()).unwrap();

        assert_eq!(runs.len(), strategies.len());
        for (run, strategy) in runs.iter().zip(&strategies) {
            assert_eq!(run.name, strategy.name());
            assert_eq!(run.outcome.history.len(), 60);
        }
    }

    #[test]
    fn leader_on_rising_market_is_all_in_hold() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + i as f64).collect();
        let bars = series(&closes);
        let sim = SimulationConfig {
            monthly_cash: 0.0,
            exposure: ExposurePolicy::FixedFraction(1.0),
            ..SimulationConfig::default()
        };
        let strategies = vec![
            StrategyKind::BuyAndHold {
                reinvest_contributions: false,
            },
            StrategyKind::ConsecutiveDownDays { days: 3 },
        ];
        let runs = compare_strategies(&bars, &strategies, &sim).unwrap();
        assert_eq!(leader(&runs).map(|r| r.name.as_str()), Some("buy_and_hold"));
        // never triggers on a rising series
        assert_eq!(runs[1].outcome.profit_percent, 0.0);
    }

    #[test]
    fn empty_series_rejected() {
        let err = compare_strategies(&[], &StrategyKind::builtin(), &SimulationConfig::default())
            .unwrap_err();
        assert!(matches!(err, StratsweepError::EmptySeries));
    }
}
