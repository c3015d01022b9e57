//! CSV file price adapter.
//!
//! One file per ticker, `<base>/<TICKER>.csv`, with a header row holding a
//! `date` column and an `adj_close` or `close` column. Adjusted closes are
//! preferred when both are present.

use crate::domain::error::TitanError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn column_index(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

impl PriceDataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, TitanError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TitanError::NoData {
                ticker: ticker.to_string(),
            },
            _ => TitanError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers()?.clone();
        let date_col = column_index(&headers, &["date"]).ok_or_else(|| TitanError::Data {
            reason: format!("{}: missing date column", path.display()),
        })?;
        let close_col =
            column_index(&headers, &["adj_close", "close"]).ok_or_else(|| TitanError::Data {
                reason: format!("{}: missing adj_close or close column", path.display()),
            })?;

        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                TitanError::Data {
                    reason: format!("{}: invalid date '{}': {}", ticker, date_str, e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let close_str = record.get(close_col).unwrap_or_default().trim();
            // Blank closes are non-trading rows.
            if close_str.is_empty() {
                continue;
            }
            let close: f64 = close_str.parse().map_err(|e| TitanError::Data {
                reason: format!("{}: invalid close '{}' on {}: {}", ticker, close_str, date, e),
            })?;

            points.push(PricePoint { date, close });
        }

        Ok(PriceSeries::new(ticker, points))
    }

    fn list_tickers(&self) -> Result<Vec<String>, TitanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TitanError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tickers.push(stem.to_uppercase());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
