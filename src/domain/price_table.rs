//! Aligned close-price table and unified timeline.
//!
//! Every ticker becomes a column indexed by the shared timeline. A column is
//! forward-filled after its first observation and empty before it.

use crate::domain::error::TitanError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    FetchFailed(String),
    InsufficientHistory { observations: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    date_index: HashMap<NaiveDate, usize>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Clone)]
pub struct Alignment {
    pub table: PriceTable,
    pub skipped: Vec<SkippedTicker>,
}

impl PriceTable {
    /// Aligns raw series onto the union of their dates.
    ///
    /// Series with fewer than `min_history` observations are excluded and
    /// reported in [`Alignment::skipped`].
    pub fn align(series: Vec<PriceSeries>, min_history: usize) -> Result<Alignment, TitanError> {
        let mut kept = Vec::with_capacity(series.len());
        let mut skipped = Vec::new();

        for s in series {
            for point in &s.points {
                if !point.close.is_finite() || point.close <= 0.0 {
                    return Err(TitanError::InvalidPrice {
                        ticker: s.ticker.clone(),
                        date: point.date,
                        value: point.close,
                    });
                }
            }
            if s.is_empty() {
                skipped.push(SkippedTicker {
                    ticker: s.ticker,
                    reason: SkipReason::NoData,
                });
            } else if s.len() < min_history {
                skipped.push(SkippedTicker {
                    reason: SkipReason::InsufficientHistory {
                        observations: s.len(),
                    },
                    ticker: s.ticker,
                });
            } else {
                kept.push(s);
            }
        }

        let dates = build_unified_timeline(&kept);
        let date_index: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();

        let mut columns = BTreeMap::new();
        for s in kept {
            let mut column = vec![None; dates.len()];
            for point in &s.points {
                column[date_index[&point.date]] = Some(point.close);
            }
            let mut last = None;
            for slot in column.iter_mut() {
                match slot {
                    Some(v) => last = Some(*v),
                    None => *slot = last,
                }
            }
            columns.insert(s.ticker, column);
        }

        Ok(Alignment {
            table: PriceTable {
                dates,
                date_index,
                columns,
            },
            skipped,
        })
    }

    /// Builds a table from already aligned columns. Every column must be as
    /// long as `dates`.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: BTreeMap<String, Vec<Option<f64>>>,
    ) -> Result<Self, TitanError> {
        for window in dates.windows(2) {
            if window[0] >= window[1] {
                return Err(TitanError::Data {
                    reason: format!("timeline not strictly increasing at {}", window[1]),
                });
            }
        }
        for (ticker, column) in &columns {
            if column.len() != dates.len() {
                return Err(TitanError::Data {
                    reason: format!(
                        "column {} has {} rows, timeline has {}",
                        ticker,
                        column.len(),
                        dates.len()
                    ),
                });
            }
        }
        let date_index = dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();
        Ok(PriceTable {
            dates,
            date_index,
            columns,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_ticker(&self, ticker: &str) -> bool {
        self.columns.contains_key(ticker)
    }

    pub fn column(&self, ticker: &str) -> Option<&[Option<f64>]> {
        self.columns.get(ticker).map(Vec::as_slice)
    }

    pub fn price(&self, ticker: &str, index: usize) -> Option<f64> {
        self.columns.get(ticker)?.get(index).copied().flatten()
    }

    /// Price required for accounting; absence is a fatal data error.
    pub fn require_price(&self, ticker: &str, index: usize) -> Result<f64, TitanError> {
        let date = self.date_at(index).ok_or_else(|| TitanError::Data {
            reason: format!("trading index {} outside timeline", index),
        })?;
        match self.price(ticker, index) {
            Some(p) if p.is_finite() && p > 0.0 => Ok(p),
            Some(p) => Err(TitanError::InvalidPrice {
                ticker: ticker.to_string(),
                date,
                value: p,
            }),
            None => Err(TitanError::MissingPrice {
                ticker: ticker.to_string(),
                date,
            }),
        }
    }
}

pub fn build_unified_timeline(series: &[PriceSeries]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.date))
        .collect();
    unique_dates.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;

    fn series(ticker: &str, points: &[(&str, f64)]) -> PriceSeries {
        PriceSeries::new(
            ticker,
            points
                .iter()
                .map(|(d, c)| PricePoint {
                    date: NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
                    close: *c,
                })
                .collect(),
        )
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn unified_timeline_merges_and_sorts() {
        let a = series("A", &[("2024-01-02", 1.0), ("2024-01-05", 2.0)]);
        let b = series("B", &[("2024-01-01", 1.0), ("2024-01-03", 2.0)]);
        let timeline = build_unified_timeline(&[a, b]);
        assert_eq!(
            timeline,
            vec![d("2024-01-01"), d("2024-01-02"), d("2024-01-03"), d("2024-01-05")]
        );
    }

    #[test]
    fn align_forward_fills_gaps_and_leaves_leading_none() {
        let a = series(
            "A",
            &[("2024-01-01", 10.0), ("2024-01-02", 11.0), ("2024-01-04", 12.0)],
        );
        let b = series("B", &[("2024-01-02", 5.0), ("2024-01-03", 6.0), ("2024-01-04", 7.0)]);
        let alignment = PriceTable::align(vec![a, b], 1).unwrap();
        let table = alignment.table;

        assert_eq!(table.len(), 4);
        assert_eq!(
            table.column("A").unwrap(),
            &[Some(10.0), Some(11.0), Some(11.0), Some(12.0)]
        );
        assert_eq!(table.column("B").unwrap(), &[None, Some(5.0), Some(6.0), Some(7.0)]);
        assert!(alignment.skipped.is_empty());
    }

    #[test]
    fn align_excludes_short_history() {
        let a = series("A", &[("2024-01-01", 10.0), ("2024-01-02", 11.0), ("2024-01-03", 12.0)]);
        let b = series("B", &[("2024-01-03", 5.0)]);
        let c = series("C", &[]);
        let alignment = PriceTable::align(vec![a, b, c], 2).unwrap();

        assert!(alignment.table.has_ticker("A"));
        assert!(!alignment.table.has_ticker("B"));
        assert_eq!(alignment.skipped.len(), 2);
        assert_eq!(
            alignment.skipped[0].reason,
            SkipReason::InsufficientHistory { observations: 1 }
        );
        assert_eq!(alignment.skipped[1].reason, SkipReason::NoData);
    }

    #[test]
    fn align_rejects_non_positive_price() {
        let a = series("A", &[("2024-01-01", 10.0), ("2024-01-02", 0.0)]);
        let err = PriceTable::align(vec![a], 1).unwrap_err();
        assert!(
            matches!(err, TitanError::InvalidPrice { ticker, date, .. } if ticker == "A" && date == d("2024-01-02"))
        );
    }

    #[test]
    fn require_price_reports_missing_with_context() {
        let a = series("A", &[("2024-01-01", 10.0), ("2024-01-02", 11.0)]);
        let b = series("B", &[("2024-01-02", 5.0), ("2024-01-03", 6.0)]);
        let table = PriceTable::align(vec![a, b], 1).unwrap().table;

        assert_eq!(table.require_price("B", 1).unwrap(), 5.0);
        let err = table.require_price("B", 0).unwrap_err();
        assert!(
            matches!(err, TitanError::MissingPrice { ticker, date } if ticker == "B" && date == d("2024-01-01"))
        );
        let err = table.require_price("ZZZ", 0).unwrap_err();
        assert!(matches!(err, TitanError::MissingPrice { .. }));
    }

    #[test]
    fn from_columns_validates_shape() {
        let dates = vec![d("2024-01-01"), d("2024-01-02")];
        let mut columns = BTreeMap::new();
        columns.insert("A".to_string(), vec![Some(1.0)]);
        assert!(PriceTable::from_columns(dates.clone(), columns).is_err());

        let mut columns = BTreeMap::new();
        columns.insert("A".to_string(), vec![Some(1.0), None]);
        let table = PriceTable::from_columns(dates, columns).unwrap();
        assert_eq!(table.index_of(d("2024-01-02")), Some(1));
        assert_eq!(table.price("A", 1), None);
    }

    #[test]
    fn from_columns_rejects_unordered_dates() {
        let dates = vec![d("2024-01-02"), d("2024-01-01")];
        assert!(PriceTable::from_columns(dates, BTreeMap::new()).is_err());
    }
}
