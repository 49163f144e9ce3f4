//! Single-run simulator: one day-by-day pass over one price window.
//!
//! Per day: inject scheduled cash, fire armed protective thresholds, ask the
//! strategy for an intent, route it. The run finishes by valuing the position
//! at the last close.

use chrono::NaiveDate;

use super::error::StratsweepError;
use super::order::ExposurePolicy;
use super::portfolio::{Portfolio, round2};
use super::price::{PriceBar, validate_series};
use super::router::{OrderRouter, RouteOutcome};
use super::strategy::{DecisionContext, Strategy};

pub const DEFAULT_START_CASH: f64 = 100_000.0;
pub const DEFAULT_MONTHLY_CASH: f64 = 1_000.0;
/// Trading days between cash injections.
pub const DEFAULT_CONTRIBUTION_INTERVAL: usize = 21;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub start_cash: f64,
    pub monthly_cash: f64,
    pub contribution_interval: usize,
    /// Inject on day 0 as well as every `contribution_interval` days after.
    pub inject_on_first_day: bool,
    pub exposure: ExposurePolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            start_cash: DEFAULT_START_CASH,
            monthly_cash: DEFAULT_MONTHLY_CASH,
            contribution_interval: DEFAULT_CONTRIBUTION_INTERVAL,
            inject_on_first_day: true,
            exposure: ExposurePolicy::default(),
        }
    }
}

impl SimulationConfig {
    pub fn is_contribution_day(&self, day: usize) -> bool {
        day % self.contribution_interval == 0 && (day > 0 || self.inject_on_first_day)
    }

    /// Reject configurations that cannot produce a profit percentage.
    pub fn validate(&self) -> Result<(), StratsweepError> {
        if !(self.start_cash.is_finite() && self.start_cash >= 0.0) {
            return Err(StratsweepError::ConfigInvalid {
                section: "simulation".into(),
                key: "start_cash".into(),
                reason: "start_cash must be non-negative".into(),
            });
        }
        if !(self.monthly_cash.is_finite() && self.monthly_cash >= 0.0) {
            return Err(StratsweepError::ConfigInvalid {
                section: "simulation".into(),
                key: "monthly_cash".into(),
                reason: "monthly_cash must be non-negative".into(),
            });
        }
        if self.contribution_interval == 0 {
            return Err(StratsweepError::ConfigInvalid {
                section: "simulation".into(),
                key: "contribution_interval".into(),
                reason: "contribution_interval must be at least 1".into(),
            });
        }
        let first_day_cash = self.start_cash
            + if self.inject_on_first_day {
                self.monthly_cash
            } else {
                0.0
            };
        if first_day_cash <= 0.0 {
            return Err(StratsweepError::ZeroContribution {
                start_cash: self.start_cash,
                monthly_cash: self.monthly_cash,
            });
        }
        self.exposure.validate()
    }
}

/// Portfolio state at the close of one day.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    pub value: f64,
    pub invested: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub cash: f64,
    pub owned_quantity: f64,
    pub total_contributed: f64,
    pub final_price: f64,
    pub stock_value: f64,
    pub final_value: f64,
    pub profit: f64,
    pub profit_percent: f64,
    pub fills: usize,
    pub rejections: usize,
    pub liquidations: usize,
    /// Empty unless the run was started with history recording.
    pub history: Vec<PortfolioSnapshot>,
}

/// Run one simulation over `series` (chronological).
pub fn simulate<S>(
    series: &[PriceBar],
    strategy: &S,
    config: &SimulationConfig,
) -> Result<RunOutcome, StratsweepError>
where
    S: Strategy + ?Sized,
{
    config.validate()?;
    validate_series(series)?;
    Ok(run_validated(series, strategy, config, false))
}

/// Like [`simulate`], also recording a [`PortfolioSnapshot`] per day.
pub fn simulate_with_history<S>(
    series: &[PriceBar],
    strategy: &S,
    config: &SimulationConfig,
) -> Result<RunOutcome, StratsweepError>
where
    S: Strategy + ?Sized,
{
    config.validate()?;
    validate_series(series)?;
    Ok(run_validated(series, strategy, config, true))
}

/// Simulation body. Callers have validated `series` and `config`.
pub(crate) fn run_validated<S>(
    series: &[PriceBar],
    strategy: &S,
    config: &SimulationConfig,
    record_history: bool,
) -> RunOutcome
where
    S: Strategy + ?Sized,
{
    let mut portfolio = Portfolio::new(config.start_cash);
    let mut router = OrderRouter::new(config.exposure);
    let mut fills = 0usize;
    let mut rejections = 0usize;
    let mut liquidations = 0usize;
    let mut history = Vec::with_capacity(if record_history { series.len() } else { 0 });

    for (day, bar) in series.iter().enumerate() {
        let price = bar.price();

        let contribution_day = config.is_contribution_day(day);
        if contribution_day {
            portfolio.inject(config.monthly_cash);
        }

        if router.check_triggers(&mut portfolio, price).is_some() {
            liquidations += 1;
        }

        let ctx = DecisionContext {
            cash: portfolio.cash,
            monthly_cash: config.monthly_cash,
            contribution_day,
        };
        let intent = strategy.decide(day, series, &ctx);

        match router.route(&mut portfolio, intent, price) {
            RouteOutcome::Filled { .. } => fills += 1,
            RouteOutcome::Rejected => rejections += 1,
            RouteOutcome::Armed | RouteOutcome::Ignored | RouteOutcome::NoAction => {}
        }

        if record_history {
            history.push(PortfolioSnapshot {
                date: bar.date,
                value: round2(portfolio.value(price)),
                invested: round2(portfolio.total_contributed),
                profit: round2(portfolio.profit(price)),
            });
        }
    }

    // validated series is non-empty
    let final_price = series[series.len() - 1].price();
    let stock_value = portfolio.stock_value(final_price);

    RunOutcome {
        cash: portfolio.cash,
        owned_quantity: portfolio.owned_quantity,
        total_contributed: portfolio.total_contributed,
        final_price,
        stock_value,
        final_value: portfolio.value(final_price),
        profit: portfolio.profit(final_price),
        profit_percent: portfolio.profit_percent(final_price),
        fills,
        rejections,
        liquidations,
        history,
    }
}
