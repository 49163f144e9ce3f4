//! Pluggable trading-decision rules.
//!
//! A [`Strategy`] is a pure function of the day index, the price series and a
//! read-only [`DecisionContext`]. It may only look at bars `0..=day`; the
//! built-in rules return [`OrderIntent::Hold`] until they have
//! [`Strategy::warmup`] bars of history.

use std::fmt;

use super::error::StratsweepError;
use super::order::OrderIntent;
use super::price::PriceBar;
use crate::ports::config_port::ConfigPort;

/// Simulation state a strategy may consult.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecisionContext {
    pub cash: f64,
    pub monthly_cash: f64,
    /// Whether cash was injected at the start of this day.
    pub contribution_day: bool,
}

pub trait Strategy {
    /// Stable identifier used in configuration files.
    fn name(&self) -> &'static str;

    /// Human-readable description with parameters, for reports.
    fn label(&self) -> String;

    /// Bars of history needed before the rule can trade.
    fn warmup(&self) -> usize {
        0
    }

    fn decide(&self, day: usize, series: &[PriceBar], ctx: &DecisionContext) -> OrderIntent;
}

pub const DEFAULT_DOWN_DAYS: usize = 3;
pub const DEFAULT_DIP_THRESHOLD: f64 = 0.05;
pub const DEFAULT_DIP_LOOKBACK: usize = 10;
pub const DEFAULT_SHORT_WINDOW: usize = 10;
pub const DEFAULT_LONG_WINDOW: usize = 30;
pub const DEFAULT_DECLINE_DAYS: usize = 3;

/// Built-in strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyKind {
    BuyEveryDay,
    BuyAndHold {
        /// Also buy on contribution days while cash is available.
        reinvest_contributions: bool,
    },
    ConsecutiveDownDays {
        days: usize,
    },
    BuyTheDip {
        dip_threshold: f64,
        lookback: usize,
    },
    MovingAverageCrossover {
        short_window: usize,
        long_window: usize,
        sell_on_cross_below: bool,
    },
    ReversalAfterDecline {
        decline_days: usize,
    },
}

impl StrategyKind {
    /// Every built-in strategy with default parameters.
    pub fn builtin() -> Vec<StrategyKind> {
        vec![
            StrategyKind::BuyEveryDay,
            StrategyKind::BuyAndHold {
                reinvest_contributions: false,
            },
            StrategyKind::ConsecutiveDownDays {
                days: DEFAULT_DOWN_DAYS,
            },
            StrategyKind::BuyTheDip {
                dip_threshold: DEFAULT_DIP_THRESHOLD,
                lookback: DEFAULT_DIP_LOOKBACK,
            },
            StrategyKind::MovingAverageCrossover {
                short_window: DEFAULT_SHORT_WINDOW,
                long_window: DEFAULT_LONG_WINDOW,
                sell_on_cross_below: false,
            },
            StrategyKind::ReversalAfterDecline {
                decline_days: DEFAULT_DECLINE_DAYS,
            },
        ]
    }

    /// Look up a built-in by config name, with default parameters.
    pub fn from_name(name: &str) -> Result<StrategyKind, StratsweepError> {
        let normalized = name.trim().to_lowercase();
        let canonical = match normalized.as_str() {
            "buy_after_3_down" | "buy_after_3_consecutive_down_days" => "buy_after_down_days",
            other => other,
        };
        Self::builtin()
            .into_iter()
            .find(|s| s.name() == canonical)
            .ok_or_else(|| StratsweepError::UnknownStrategy {
                name: name.to_string(),
            })
    }

    /// Build from the `[strategy]` section, applying parameter overrides.
    pub fn from_config(config: &dyn ConfigPort) -> Result<StrategyKind, StratsweepError> {
        let name = config.get_string("strategy", "name").ok_or_else(|| {
            StratsweepError::ConfigMissing {
                section: "strategy".into(),
                key: "name".into(),
            }
        })?;
        Self::from_name_with_config(&name, config)
    }

    /// Look up `name`, taking parameters from the `[strategy]` section.
    pub fn from_name_with_config(
        name: &str,
        config: &dyn ConfigPort,
    ) -> Result<StrategyKind, StratsweepError> {
        let window = |key: &str, default: usize| -> usize {
            config.get_int("strategy", key, default as i64).max(0) as usize
        };

        Ok(match Self::from_name(name)? {
            StrategyKind::BuyEveryDay => StrategyKind::BuyEveryDay,
            StrategyKind::BuyAndHold { .. } => StrategyKind::BuyAndHold {
                reinvest_contributions: config.get_bool(
                    "strategy",
                    "reinvest_contributions",
                    false,
                ),
            },
            StrategyKind::ConsecutiveDownDays { .. } => StrategyKind::ConsecutiveDownDays {
                days: window("down_days", DEFAULT_DOWN_DAYS),
            },
            StrategyKind::BuyTheDip { .. } => StrategyKind::BuyTheDip {
                dip_threshold: config.get_double(
                    "strategy",
                    "dip_threshold",
                    DEFAULT_DIP_THRESHOLD,
                ),
                lookback: window("lookback", DEFAULT_DIP_LOOKBACK),
            },
            StrategyKind::MovingAverageCrossover { .. } => StrategyKind::MovingAverageCrossover {
                short_window: window("short_window", DEFAULT_SHORT_WINDOW),
                long_window: window("long_window", DEFAULT_LONG_WINDOW),
                sell_on_cross_below: config.get_bool("strategy", "sell_on_cross_below", false),
            },
            StrategyKind::ReversalAfterDecline { .. } => StrategyKind::ReversalAfterDecline {
                decline_days: window("decline_days", DEFAULT_DECLINE_DAYS),
            },
        })
    }
}

impl Strategy for StrategyKind {
    fn name(&self) -> &'static str {
        match self {
            StrategyKind::BuyEveryDay => "buy_everyday",
            StrategyKind::BuyAndHold { .. } => "buy_and_hold",
            StrategyKind::ConsecutiveDownDays { .. } => "buy_after_down_days",
            StrategyKind::BuyTheDip { .. } => "buy_the_dip",
            StrategyKind::MovingAverageCrossover { .. } => "ma_crossover",
            StrategyKind::ReversalAfterDecline { .. } => "reversal_after_decline",
        }
    }

    fn label(&self) -> String {
        self.to_string()
    }

    fn warmup(&self) -> usize {
        match *self {
            StrategyKind::BuyEveryDay | StrategyKind::BuyAndHold { .. } => 0,
            StrategyKind::ConsecutiveDownDays { days } => days,
            StrategyKind::BuyTheDip { .. } => 1,
            StrategyKind::MovingAverageCrossover { long_window, .. } => long_window.max(1),
            StrategyKind::ReversalAfterDecline { decline_days } => decline_days + 1,
        }
    }

    fn decide(&self, day: usize, series: &[PriceBar], ctx: &DecisionContext) -> OrderIntent {
        if day >= series.len() || day < self.warmup() {
            return OrderIntent::Hold;
        }

        let signal = match *self {
            StrategyKind::BuyEveryDay => true,
            StrategyKind::BuyAndHold {
                reinvest_contributions,
            } => {
                day == 0
                    || (reinvest_contributions
                        && ctx.contribution_day
                        && ctx.monthly_cash > 0.0
                        && ctx.cash > 0.0)
            }
            StrategyKind::ConsecutiveDownDays { days } => {
                strictly_decreasing(&series[day - days..=day])
            }
            StrategyKind::BuyTheDip {
                dip_threshold,
                lookback,
            } => {
                let recent_high = series[day.saturating_sub(lookback)..day]
                    .iter()
                    .map(PriceBar::price)
                    .fold(f64::NEG_INFINITY, f64::max);
                series[day].price() < recent_high * (1.0 - dip_threshold)
            }
            StrategyKind::MovingAverageCrossover {
                short_window,
                long_window,
                sell_on_cross_below,
            } => {
                let prev_short = sma(series, day - 1, short_window);
                let prev_long = sma(series, day - 1, long_window);
                let short = sma(series, day, short_window);
                let long = sma(series, day, long_window);

                if prev_short <= prev_long && short > long {
                    true
                } else {
                    if sell_on_cross_below && prev_short >= prev_long && short < long {
                        return OrderIntent::Sell;
                    }
                    false
                }
            }
            StrategyKind::ReversalAfterDecline { decline_days } => {
                let start = day - decline_days - 1;
                strictly_decreasing(&series[start..day])
                    && series[day].price() > series[day - 1].price()
            }
        };

        if signal {
            OrderIntent::Buy
        } else {
            OrderIntent::Hold
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::BuyEveryDay => write!(f, "Buy every day"),
            StrategyKind::BuyAndHold {
                reinvest_contributions: false,
            } => write!(f, "Buy and hold"),
            StrategyKind::BuyAndHold {
                reinvest_contributions: true,
            } => write!(f, "Buy and hold (reinvest contributions)"),
            StrategyKind::ConsecutiveDownDays { days } => {
                write!(f, "Buy after {days} consecutive down days")
            }
            StrategyKind::BuyTheDip {
                dip_threshold,
                lookback,
            } => write!(
                f,
                "Buy the dip ({:.1}% below {lookback}-day high)",
                dip_threshold * 100.0
            ),
            StrategyKind::MovingAverageCrossover {
                short_window,
                long_window,
                ..
            } => write!(f, "SMA({short_window}) / SMA({long_window}) crossover"),
            StrategyKind::ReversalAfterDecline { decline_days } => {
                write!(f, "Reversal after {decline_days}-day decline")
            }
        }
    }
}

/// Closes strictly decreasing across the whole slice.
fn strictly_decreasing(bars: &[PriceBar]) -> bool {
    bars.windows(2).all(|w| w[0].price() > w[1].price())
}

/// Simple moving average of the `period` closes ending at `end` (inclusive).
/// Uses fewer bars when `end + 1 < period`.
fn sma(series: &[PriceBar], end: usize, period: usize) -> f64 {
    let start = (end + 1).saturating_sub(period.max(1));
    let window = &series[start..=end];
    window.iter().map(PriceBar::price).sum::<f64>() / window.len() as f64
}
