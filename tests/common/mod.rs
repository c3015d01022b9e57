#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use titan::domain::asset::Category;
use titan::domain::commission::{CommissionModel, CommissionTier};
use titan::domain::error::TitanError;
use titan::domain::price::{PricePoint, PriceSeries};
use titan::domain::price_table::PriceTable;
use titan::domain::schedule::RebalanceWeekday;
use titan::domain::selector::SelectionParams;
use titan::domain::signal::SignalEngine;
use titan::domain::simulator::EngineContext;
use titan::domain::universe::CategoryMap;
use titan::ports::data_port::PriceDataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, ticker: &str, dates: &[NaiveDate], closes: &[f64]) -> Self {
        let points = dates
            .iter()
            .zip(closes)
            .map(|(&date, &close)| PricePoint { date, close })
            .collect();
        self.data.insert(ticker.to_string(), points);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockDataPort {
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, TitanError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TitanError::Data {
                reason: reason.clone(),
            });
        }
        let points = self
            .data
            .get(ticker)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(PriceSeries::new(ticker, points))
    }

    fn list_tickers(&self) -> Result<Vec<String>, TitanError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` consecutive weekdays starting at `start` (inclusive).
pub fn weekdays(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut day = start;
    while dates.len() < count {
        if day.weekday().number_from_monday() <= 5 {
            dates.push(day);
        }
        day = day.succ_opt().unwrap();
    }
    dates
}

/// Deterministic path: linear drift plus an alternating wobble so the
/// return series always has non-zero variance.
pub fn trending_closes(count: usize, start_price: f64, drift: f64, wobble: f64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let w = match i % 3 {
                0 => wobble,
                1 => -wobble,
                _ => 0.0,
            };
            start_price * (1.0 + drift).powi(i as i32) + w
        })
        .collect()
}

pub fn make_table(dates: Vec<NaiveDate>, columns: Vec<(&str, Vec<Option<f64>>)>) -> PriceTable {
    let map: BTreeMap<String, Vec<Option<f64>>> = columns
        .into_iter()
        .map(|(t, c)| (t.to_string(), c))
        .collect();
    PriceTable::from_columns(dates, map).unwrap()
}

pub fn some(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

pub fn make_categories(pairs: &[(&str, Category)]) -> CategoryMap {
    CategoryMap::from_pairs(pairs.iter().map(|(t, c)| (t.to_string(), *c))).unwrap()
}

pub fn free_commission() -> CommissionModel {
    CommissionModel {
        tiers: vec![CommissionTier {
            up_to_shares: None,
            per_share_rate: 0.0,
        }],
        min_fee: 0.0,
        max_pct: 0.0,
    }
}

pub fn make_context<'a>(
    prices: &'a PriceTable,
    categories: &'a CategoryMap,
    lookback: usize,
    top_n: usize,
    max_category_weight: f64,
) -> EngineContext<'a> {
    EngineContext {
        prices,
        categories,
        signal: SignalEngine::new(lookback, lookback),
        selection: SelectionParams {
            top_n,
            max_category_weight,
        },
        commission: CommissionModel::default(),
        stop_loss_pct: -0.07,
        rebalance_weekday: RebalanceWeekday::Friday,
    }
}

/// Six tickers over three categories with different drifts.
pub fn sample_universe(days: usize) -> (PriceTable, CategoryMap) {
    let dates = weekdays(date(2024, 1, 1), days);
    let specs: [(&str, Category, f64, f64, f64); 6] = [
        ("NVDA", Category::AggressiveGrowth, 100.0, 0.004, 0.8),
        ("TSLA", Category::AggressiveGrowth, 200.0, 0.003, 2.5),
        ("GLD", Category::Commodities, 180.0, 0.002, 0.6),
        ("SLV", Category::Commodities, 22.0, -0.001, 0.1),
        ("TLT", Category::BondsHedges, 95.0, 0.001, 0.3),
        ("IEF", Category::BondsHedges, 96.0, 0.0015, 0.2),
    ];
    let columns = specs
        .iter()
        .map(|(t, _, start, drift, wobble)| (*t, some(&trending_closes(days, *start, *drift, *wobble))))
        .collect();
    let categories = make_categories(
        &specs
            .iter()
            .map(|(t, c, _, _, _)| (*t, *c))
            .collect::<Vec<_>>(),
    );
    (make_table(dates, columns), categories)
}
