//! Price history port trait.

use crate::domain::error::StratsweepError;
use crate::domain::price::PriceBar;
use chrono::NaiveDate;

/// Source of daily price history. Implementations return bars oldest first,
/// one per trading day, with strictly increasing dates and positive prices.
pub trait DataPort {
    /// Bars for `symbol` between `start_date` and `end_date` inclusive; open
    /// bounds are unrestricted.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, StratsweepError>;

    /// The newest `rows` bars for `symbol`.
    fn fetch_latest(&self, symbol: &str, rows: usize) -> Result<Vec<PriceBar>, StratsweepError> {
        let mut bars = self.fetch_prices(symbol, None, None)?;
        let skip = bars.len().saturating_sub(rows);
        bars.drain(..skip);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratsweepError>;
}
