//! Order intents emitted by strategies and exposure-based order sizing.

use std::fmt;

use super::error::StratsweepError;

/// What a strategy wants done on a given day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderIntent {
    Buy,
    Sell,
    /// Arm a stop-loss at the given price.
    StopLoss(f64),
    /// Arm a take-profit at the given price.
    TakeProfit(f64),
    Hold,
}

impl OrderIntent {
    pub fn is_trade(&self) -> bool {
        matches!(self, OrderIntent::Buy | OrderIntent::Sell)
    }
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderIntent::Buy => write!(f, "buy"),
            OrderIntent::Sell => write!(f, "sell"),
            OrderIntent::StopLoss(t) => write!(f, "stop_loss({t})"),
            OrderIntent::TakeProfit(t) => write!(f, "take_profit({t})"),
            OrderIntent::Hold => write!(f, "hold"),
        }
    }
}

/// Rule converting available cash into an order quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExposurePolicy {
    /// Commit `fraction` of current cash per order.
    FixedFraction(f64),
    /// Trade a fixed number of shares per order.
    FixedQuantity(f64),
}

impl Default for ExposurePolicy {
    fn default() -> Self {
        ExposurePolicy::FixedFraction(0.1)
    }
}

impl ExposurePolicy {
    /// FixedFraction: (cash * fraction) / price. FixedQuantity: the configured quantity.
    pub fn order_quantity(&self, cash: f64, price: f64) -> f64 {
        match *self {
            ExposurePolicy::FixedFraction(fraction) => (cash * fraction) / price,
            ExposurePolicy::FixedQuantity(quantity) => quantity,
        }
    }

    pub fn validate(&self) -> Result<(), StratsweepError> {
        match *self {
            ExposurePolicy::FixedFraction(f) if !(f.is_finite() && f > 0.0 && f <= 1.0) => {
                Err(StratsweepError::InvalidExposure {
                    reason: format!("fraction must be in (0, 1], got {f}"),
                })
            }
            ExposurePolicy::FixedQuantity(q) if !(q.is_finite() && q > 0.0) => {
                Err(StratsweepError::InvalidExposure {
                    reason: format!("quantity must be positive, got {q}"),
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ExposurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposurePolicy::FixedFraction(v) => write!(f, "{:.0}% of cash", v * 100.0),
            ExposurePolicy::FixedQuantity(v) => write!(f, "{v} shares"),
        }
    }
}

/// Stop-loss and take-profit thresholds must be finite, positive whole numbers.
pub fn is_whole_threshold(value: f64) -> bool {
    value.is_finite() && value > 0.0 && value.fract() == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fraction_sizes_from_cash() {
        let policy = ExposurePolicy::FixedFraction(0.1);
        assert_relative_eq!(policy.order_quantity(1000.0, 50.0), 2.0);
    }

    #[test]
    fn quantity_ignores_cash_and_price() {
        let policy = ExposurePolicy::FixedQuantity(3.0);
        assert_eq!(policy.order_quantity(0.0, 50.0), 3.0);
        assert_eq!(policy.order_quantity(1e6, 1.0), 3.0);
    }

    #[test]
    fn validate_fraction_bounds() {
        assert!(ExposurePolicy::FixedFraction(1.0).validate().is_ok());
        assert!(ExposurePolicy::FixedFraction(0.0).validate().is_err());
        assert!(ExposurePolicy::FixedFraction(1.5).validate().is_err());
        assert!(ExposurePolicy::FixedFraction(f64::NAN).validate().is_err());
    }

    #[test]
    fn validate_quantity_positive() {
        assert!(ExposurePolicy::FixedQuantity(1.0).validate().is_ok());
        assert!(ExposurePolicy::FixedQuantity(0.0).validate().is_err());
        assert!(ExposurePolicy::FixedQuantity(-2.0).validate().is_err());
    }

    #[test]
    fn whole_thresholds() {
        assert!(is_whole_threshold(95.0));
        assert!(!is_whole_threshold(95.5));
        assert!(!is_whole_threshold(0.0));
        assert!(!is_whole_threshold(-5.0));
        assert!(!is_whole_threshold(f64::INFINITY));
    }

    #[test]
    fn only_buy_and_sell_trade() {
        assert!(OrderIntent::Buy.is_trade());
        assert!(OrderIntent::Sell.is_trade());
        assert!(!OrderIntent::Hold.is_trade());
        assert!(!OrderIntent::StopLoss(90.0).is_trade());
    }

    #[test]
    fn intent_display() {
        assert_eq!(OrderIntent::TakeProfit(120.0).to_string(), "take_profit(120)");
        assert_eq!(OrderIntent::Hold.to_string(), "hold");
    }
}
