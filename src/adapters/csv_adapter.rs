//! CSV price history adapter.
//!
//! One `<SYMBOL>.csv` file per symbol under a base directory. Columns are
//! located by header name, so both `date,open,high,low,close,volume` exports
//! and quote-site exports (`"Date","Price","Open","High","Low","Vol.","Change %"`,
//! newest first, `MM/DD/YYYY` dates) are accepted.

use crate::domain::error::StratsweepError;
use crate::domain::price::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Parse a whole price file, oldest bar first.
    pub fn read_file(path: &Path) -> Result<Vec<PriceBar>, StratsweepError> {
        let file = fs::File::open(path).map_err(|e| StratsweepError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::parse(file)
    }

    /// Parse CSV content. Rows with unparseable fields or non-positive prices
    /// are dropped; the result is sorted by date with one bar per date.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<PriceBar>, StratsweepError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| StratsweepError::Data {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();
        let columns = Columns::from_headers(&headers)?;

        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| StratsweepError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            match columns.bar(&record) {
                Some(bar) if bar.is_valid() => bars.push(bar),
                _ => {
                    dropped += 1;
                    debug!(row = row + 2, "dropping malformed price row");
                }
            }
        }

        if dropped > 0 {
            warn!(dropped, kept = bars.len(), "dropped malformed price rows");
        }

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, StratsweepError> {
        let mut bars = Self::read_file(&self.csv_path(symbol))?;
        bars.retain(|b| {
            start_date.is_none_or(|start| b.date >= start) && end_date.is_none_or(|end| b.date <= end)
        });
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratsweepError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StratsweepError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| StratsweepError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, StratsweepError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim_matches('"').to_lowercase())
            .collect();
        let find = |candidates: &[&str]| names.iter().position(|n| candidates.contains(&n.as_str()));

        let date = find(&["date", "timestamp"]).ok_or_else(|| StratsweepError::Data {
            reason: "missing date column".into(),
        })?;
        let close = find(&["close", "price", "adj close"]).ok_or_else(|| StratsweepError::Data {
            reason: "missing close column".into(),
        })?;

        Ok(Columns {
            date,
            close,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            volume: find(&["volume", "vol.", "vol"]),
        })
    }

    fn bar(&self, record: &csv::StringRecord) -> Option<PriceBar> {
        let date = parse_date(record.get(self.date)?)?;
        let close = parse_price(record.get(self.close)?)?;
        let optional_price = |column: Option<usize>| -> Option<f64> {
            match column {
                Some(i) => parse_price(record.get(i)?),
                None => Some(close),
            }
        };
        let volume = match self.volume {
            Some(i) => parse_volume(record.get(i).unwrap_or(""))?,
            None => 0,
        };

        Some(PriceBar {
            date,
            open: optional_price(self.open)?,
            high: optional_price(self.high)?,
            low: optional_price(self.low)?,
            close,
            volume,
        })
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim_matches('"');
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

/// Accepts thousands separators ("2,506.85").
fn parse_price(raw: &str) -> Option<f64> {
    raw.trim_matches('"').replace(',', "").parse().ok()
}

/// Accepts thousands separators, K/M/B suffixes and "-" for no volume.
fn parse_volume(raw: &str) -> Option<i64> {
    let cleaned = raw.trim_matches('"').replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return Some(0);
    }
    let (digits, multiplier) = match cleaned.chars().last()? {
        'K' | 'k' => (&cleaned[..cleaned.len() - 1], 1e3),
        'M' | 'm' => (&cleaned[..cleaned.len() - 1], 1e6),
        'B' | 'b' => (&cleaned[..cleaned.len() - 1], 1e9),
        _ => (cleaned.as_str(), 1.0),
    };
    let value: f64 = digits.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * multiplier).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let iso = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        let quote_site = "\"Date\",\"Price\",\"Open\",\"High\",\"Low\",\"Vol.\",\"Change %\"\n\
            \"01/03/2018\",\"2,713.06\",\"2,697.85\",\"2,714.37\",\"2,697.77\",\"3.54B\",\"0.64%\"\n\
            \"01/02/2018\",\"2,695.81\",\"2,683.73\",\"2,695.89\",\"2,682.36\",\"-\",\"0.83%\"\n\
            \"12/29/2017\",\"2,673.61\",\"2,689.15\",\"2,692.12\",\"2,673.61\",\"1.2M\",\"-0.52%\"\n";

        fs::write(path.join("BHP.csv"), iso).unwrap();
        fs::write(path.join("SPX.csv"), quote_site).unwrap();
        fs::write(path.join("notes.txt"), "not prices").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_prices_returns_correct_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_prices("BHP", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
    }

    #[test]
    fn fetch_prices_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let bars = adapter.fetch_prices("BHP", Some(day), Some(day)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day);

        let bars = adapter.fetch_prices("BHP", Some(day), None).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn quote_site_export_is_reordered_oldest_first() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_prices("SPX", None, None).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2017, 12, 29).unwrap());
        assert_eq!(bars[2].close, 2713.06);
        assert_eq!(bars[2].volume, 3_540_000_000);
        assert_eq!(bars[1].volume, 0);
        assert_eq!(bars[0].volume, 1_200_000);
    }

    #[test]
    fn fetch_latest_keeps_newest_rows() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_latest("BHP", 2).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());

        assert_eq!(adapter.fetch_latest("BHP", 10).unwrap().len(), 3);
    }

    #[test]
    fn fetch_prices_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let result = adapter.fetch_prices("XYZ", None, None);
        assert!(matches!(result, Err(StratsweepError::Data { .. })));
    }

    #[test]
    fn malformed_rows_are_dropped() {
        let content = "date,close\n\
            2024-01-01,10.0\n\
            not-a-date,11.0\n\
            2024-01-03,abc\n\
            2024-01-04,0\n\
            2024-01-05,-3\n\
            2024-01-06,12.5\n";
        let bars = CsvAdapter::parse(content.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 12.5);
        assert_eq!(bars[1].open, 12.5);
        assert_eq!(bars[1].volume, 0);
    }

    #[test]
    fn duplicate_dates_collapse() {
        let content = "timestamp,open,high,low,close,volume\n\
            2024-01-02 09:30:00,1,1,1,1.0,10\n\
            2024-01-02 10:00:00,2,2,2,2.0,10\n\
            2024-01-03 09:30:00,3,3,3,3.0,10\n";
        let bars = CsvAdapter::parse(content.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.0);
    }

    #[test]
    fn missing_close_column_is_an_error() {
        let content = "date,open\n2024-01-01,1.0\n";
        assert!(matches!(
            CsvAdapter::parse(content.as_bytes()),
            Err(StratsweepError::Data { .. })
        ));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP", "SPX"]);
    }

    #[test]
    fn volume_suffixes() {
        assert_eq!(parse_volume("2.5K"), Some(2500));
        assert_eq!(parse_volume("12,345"), Some(12345));
        assert_eq!(parse_volume("-"), Some(0));
        assert_eq!(parse_volume("abc"), None);
    }
}
