//! Asset universe: the ticker -> category mapping and price loading.
//!
//! The mapping is read from the `[universe]` config section, one key per
//! category holding a comma-separated ticker list, and validated so that
//! every ticker belongs to exactly one category.

use crate::domain::asset::{Asset, Category};
use crate::domain::error::TitanError;
use crate::domain::price_table::{Alignment, PriceTable, SkipReason, SkippedTicker};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

pub const UNIVERSE_SECTION: &str = "universe";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("{ticker} listed under both {first} and {second}")]
    ConflictingCategory {
        ticker: String,
        first: Category,
        second: Category,
    },

    #[error("universe is empty")]
    Empty,
}

impl From<UniverseError> for TitanError {
    fn from(err: UniverseError) -> Self {
        let key = match &err {
            UniverseError::UnknownCategory(k) => k.clone(),
            _ => "*".to_string(),
        };
        TitanError::ConfigInvalid {
            section: UNIVERSE_SECTION.to_string(),
            key,
            reason: err.to_string(),
        }
    }
}

/// Total mapping from ticker to category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryMap {
    entries: BTreeMap<String, Category>,
}

impl CategoryMap {
    pub fn from_pairs<I>(pairs: I) -> Result<Self, UniverseError>
    where
        I: IntoIterator<Item = (String, Category)>,
    {
        let mut entries = BTreeMap::new();
        for (ticker, category) in pairs {
            let ticker = ticker.trim().to_uppercase();
            if ticker.is_empty() {
                return Err(UniverseError::EmptyToken);
            }
            match entries.get(&ticker) {
                Some(&existing) if existing != category => {
                    return Err(UniverseError::ConflictingCategory {
                        ticker,
                        first: existing,
                        second: category,
                    });
                }
                Some(_) => {}
                None => {
                    entries.insert(ticker, category);
                }
            }
        }
        Ok(CategoryMap { entries })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, UniverseError> {
        let mut pairs = Vec::new();
        for key in config.get_keys(UNIVERSE_SECTION) {
            let category: Category = key
                .parse()
                .map_err(|_| UniverseError::UnknownCategory(key.clone()))?;
            let list = config
                .get_string(UNIVERSE_SECTION, &key)
                .unwrap_or_default();
            for ticker in parse_tickers(&list)? {
                pairs.push((ticker, category));
            }
        }
        let map = CategoryMap::from_pairs(pairs)?;
        if map.is_empty() {
            return Err(UniverseError::Empty);
        }
        Ok(map)
    }

    pub fn category_of(&self, ticker: &str) -> Option<Category> {
        self.entries.get(ticker).copied()
    }

    pub fn asset(&self, ticker: &str) -> Option<Asset> {
        self.category_of(ticker).map(|c| Asset::new(ticker, c))
    }

    pub fn tickers(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for category in self.entries.values() {
            *counts.entry(*category).or_insert(0) += 1;
        }
        counts
    }

    /// Restricts the map to tickers present in `table`.
    pub fn restrict_to(&self, table: &PriceTable) -> CategoryMap {
        CategoryMap {
            entries: self
                .entries
                .iter()
                .filter(|(t, _)| table.has_ticker(t))
                .map(|(t, c)| (t.clone(), *c))
                .collect(),
        }
    }
}

/// Splits a comma-separated ticker list, upper-casing and dropping
/// duplicates while preserving order.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers: Vec<String> = Vec::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }

    Ok(tickers)
}

/// Fetches every ticker in `map` and aligns the results.
///
/// Fetch failures and short histories exclude the ticker with a warning;
/// the run fails only when nothing usable remains.
pub fn load_prices(
    data_port: &dyn PriceDataPort,
    map: &CategoryMap,
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_history: usize,
) -> Result<Alignment, TitanError> {
    let mut series = Vec::with_capacity(map.len());
    let mut failed = Vec::new();

    for ticker in map.tickers() {
        match data_port.fetch_closes(&ticker, start_date, end_date) {
            Ok(s) => series.push(s),
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "skipping ticker, fetch failed");
                failed.push(SkippedTicker {
                    ticker,
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
            }
        }
    }

    let mut alignment = PriceTable::align(series, min_history)?;

    for skipped in &alignment.skipped {
        match &skipped.reason {
            SkipReason::NoData => warn!(ticker = %skipped.ticker, "skipping ticker, no data"),
            SkipReason::InsufficientHistory { observations } => warn!(
                ticker = %skipped.ticker,
                observations,
                minimum = min_history,
                "skipping ticker, insufficient history"
            ),
            SkipReason::FetchFailed(_) => {}
        }
    }
    failed.append(&mut alignment.skipped);
    alignment.skipped = failed;

    let usable = alignment.table.tickers().count();
    if usable == 0 {
        return Err(TitanError::InsufficientData {
            ticker: "all".to_string(),
            bars: 0,
            minimum: min_history,
        });
    }

    info!(
        usable,
        requested = map.len(),
        days = alignment.table.len(),
        "price table aligned"
    );

    Ok(alignment)
}

/// Universe tickers the data source cannot serve, in ticker order.
pub fn unavailable_tickers(
    data_port: &dyn PriceDataPort,
    map: &CategoryMap,
) -> Result<Vec<String>, TitanError> {
    let available: BTreeSet<String> = data_port.list_tickers()?.into_iter().collect();
    Ok(map
        .tickers()
        .into_iter()
        .filter(|t| !available.contains(t))
        .collect())
}
