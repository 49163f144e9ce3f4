//! Daily price bar representation.

use chrono::NaiveDate;

use super::error::StratsweepError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// The price a day is decided and traded at.
    pub fn price(&self) -> f64 {
        self.close
    }

    /// True when every price field is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
            && self.volume >= 0
    }
}

/// Fail fast on input the simulator cannot price: an empty series or a
/// non-positive close.
pub fn validate_series(series: &[PriceBar]) -> Result<(), StratsweepError> {
    if series.is_empty() {
        return Err(StratsweepError::EmptySeries);
    }
    match series
        .iter()
        .enumerate()
        .find(|(_, bar)| !(bar.close.is_finite() && bar.close > 0.0))
    {
        Some((index, bar)) => Err(StratsweepError::InvalidPrice {
            index,
            price: bar.close,
        }),
        None => Ok(()),
    }
}
