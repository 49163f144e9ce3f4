//! Order routing: protective triggers, exposure sizing and ledger updates.
//!
//! Each day the router first checks armed stop-loss/take-profit thresholds
//! against the price and force-liquidates the position when one is crossed.
//! Only then is the strategy's intent for the day applied.

use tracing::{debug, trace};

use super::order::{ExposurePolicy, OrderIntent, is_whole_threshold};
use super::portfolio::Portfolio;

/// Result of routing one intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteOutcome {
    Filled { quantity: f64 },
    /// Unaffordable buy or oversized sell; the ledger is unchanged.
    Rejected,
    /// A protective threshold was armed.
    Armed,
    /// Malformed threshold; nothing armed.
    Ignored,
    NoAction,
}

/// Which protective threshold fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    StopLoss,
    TakeProfit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRouter {
    exposure: ExposurePolicy,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
}

impl OrderRouter {
    pub fn new(exposure: ExposurePolicy) -> Self {
        OrderRouter {
            exposure,
            stop_loss: None,
            take_profit: None,
        }
    }

    pub fn stop_loss(&self) -> Option<f64> {
        self.stop_loss
    }

    pub fn take_profit(&self) -> Option<f64> {
        self.take_profit
    }

    /// Liquidate the whole position if an armed threshold is crossed.
    /// Both thresholds are disarmed after firing.
    pub fn check_triggers(&mut self, portfolio: &mut Portfolio, price: f64) -> Option<Trigger> {
        let trigger = match (self.stop_loss, self.take_profit) {
            (Some(stop), _) if price <= stop => Trigger::StopLoss,
            (_, Some(target)) if price >= target => Trigger::TakeProfit,
            _ => return None,
        };

        let sold = portfolio.liquidate(price);
        debug!(?trigger, price, sold, "protective threshold crossed");
        self.stop_loss = None;
        self.take_profit = None;
        Some(trigger)
    }

    /// Apply one strategy intent to the portfolio.
    pub fn route(
        &mut self,
        portfolio: &mut Portfolio,
        intent: OrderIntent,
        price: f64,
    ) -> RouteOutcome {
        match intent {
            OrderIntent::Buy => {
                let quantity = self.exposure.order_quantity(portfolio.cash, price);
                if portfolio.buy(quantity, price) {
                    RouteOutcome::Filled { quantity }
                } else {
                    trace!(quantity, price, cash = portfolio.cash, "buy rejected");
                    RouteOutcome::Rejected
                }
            }
            OrderIntent::Sell => {
                let quantity = self.exposure.order_quantity(portfolio.cash, price);
                if portfolio.sell(quantity, price) {
                    RouteOutcome::Filled { quantity }
                } else {
                    trace!(
                        quantity,
                        price,
                        owned = portfolio.owned_quantity,
                        "sell rejected"
                    );
                    RouteOutcome::Rejected
                }
            }
            OrderIntent::StopLoss(threshold) => {
                if is_whole_threshold(threshold) {
                    self.stop_loss = Some(threshold);
                    RouteOutcome::Armed
                } else {
                    debug!(threshold, "ignoring malformed stop-loss");
                    RouteOutcome::Ignored
                }
            }
            OrderIntent::TakeProfit(threshold) => {
                if is_whole_threshold(threshold) {
                    self.take_profit = Some(threshold);
                    RouteOutcome::Armed
                } else {
                    debug!(threshold, "ignoring malformed take-profit");
                    RouteOutcome::Ignored
                }
            }
            OrderIntent::Hold => RouteOutcome::NoAction,
        }
    }
}
