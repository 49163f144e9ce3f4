//! Portfolio ledger: cash, share position and cumulative contributions.

/// Relative slack allowed when an order spends the entire cash balance.
const SETTLEMENT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub owned_quantity: f64,
    pub total_contributed: f64,
}

impl Portfolio {
    pub fn new(start_cash: f64) -> Self {
        Portfolio {
            cash: start_cash,
            owned_quantity: 0.0,
            total_contributed: start_cash,
        }
    }

    /// Buy `quantity` shares at `price`. All-or-nothing: returns `false` and
    /// leaves the ledger untouched when the order is unaffordable.
    pub fn buy(&mut self, quantity: f64, price: f64) -> bool {
        if !is_tradable(quantity, price) {
            return false;
        }
        let cost = price * quantity;
        if cost > self.cash + SETTLEMENT_TOLERANCE * self.cash.max(1.0) {
            return false;
        }
        self.cash = (self.cash - cost).max(0.0);
        self.owned_quantity += quantity;
        true
    }

    /// Sell `quantity` shares at `price`. No short selling.
    pub fn sell(&mut self, quantity: f64, price: f64) -> bool {
        if !is_tradable(quantity, price) || quantity > self.owned_quantity {
            return false;
        }
        self.cash += price * quantity;
        self.owned_quantity -= quantity;
        true
    }

    /// Sell the whole position; returns the quantity sold.
    pub fn liquidate(&mut self, price: f64) -> f64 {
        let quantity = self.owned_quantity;
        if quantity > 0.0 && self.sell(quantity, price) {
            self.owned_quantity = 0.0;
            quantity
        } else {
            0.0
        }
    }

    /// Deposit cash; counts toward the profit denominator.
    pub fn inject(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.cash += amount;
            self.total_contributed += amount;
        }
    }

    pub fn stock_value(&self, price: f64) -> f64 {
        self.owned_quantity * price
    }

    pub fn value(&self, price: f64) -> f64 {
        self.cash + self.stock_value(price)
    }

    pub fn profit(&self, price: f64) -> f64 {
        self.value(price) - self.total_contributed
    }

    /// (value - contributed) / contributed * 100, rounded to 2 decimals.
    /// Callers guarantee a non-zero contribution.
    pub fn profit_percent(&self, price: f64) -> f64 {
        round2(self.profit(price) / self.total_contributed * 100.0)
    }
}

fn is_tradable(quantity: f64, price: f64) -> bool {
    quantity.is_finite() && quantity > 0.0 && price.is_finite() && price > 0.0
}

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
