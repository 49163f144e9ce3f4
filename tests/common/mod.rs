#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use stratsweep::domain::error::StratsweepError;
pub use stratsweep::domain::price::PriceBar;
use stratsweep::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, StratsweepError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StratsweepError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| start_date.is_none_or(|s| b.date >= s))
            .filter(|b| end_date.is_none_or(|e| b.date <= e))
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratsweepError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> PriceBar {
    PriceBar {
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1_000,
    }
}

/// One bar per calendar day starting at [`base_date`].
pub fn series_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(base_date() + chrono::Duration::days(i as i64), close))
        .collect()
}

pub fn flat_series(len: usize, price: f64) -> Vec<PriceBar> {
    series_from_closes(&vec![price; len])
}

/// Deterministic zig-zag around an upward drift, with runs of down days.
pub fn wavy_series(len: usize) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..len)
        .map(|i| {
            let drift = 100.0 + i as f64 * 0.2;
            let wave = [0.0, 1.5, 3.0, 2.0, 1.0, -0.5, -2.0, -1.0][i % 8];
            drift + wave
        })
        .collect();
    series_from_closes(&closes)
}

pub const BASIC_INI: &str = r#"
[data]
dir = ./data
symbol = SPX

[simulation]
start_cash = 100000
monthly_cash = 1000
contribution_interval = 21
inject_on_first_day = true

[exposure]
kind = fraction
value = 0.1

[strategy]
name = buy_after_down_days
down_days = 3

[sweep]
parallel = true
timeout_secs = 0

[compare]
strategies = buy_and_hold,buy_everyday,buy_after_down_days,buy_the_dip
rows = 252
"#;
