//! Momentum / volatility scoring.
//!
//! MOM(L)[t] = C[t] / C[t-L] - 1
//! VOL(V)[t] = sample stddev of the V daily returns C[k] / C[k-1] - 1, k in t-V+1..=t
//! RATIO     = MOM / VOL
//!
//! Each asset is scored independently from the read-only price table;
//! [`SignalEngine::score_all`] fans the universe out over a rayon pool.

use crate::domain::price_table::PriceTable;
use chrono::NaiveDate;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub date: NaiveDate,
    pub momentum: f64,
    pub volatility: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    InsufficientHistory,
    MissingPrice,
    ZeroVolatility,
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreOutcome {
    Scored(Score),
    Ineligible(IneligibleReason),
}

impl ScoreOutcome {
    pub fn score(&self) -> Option<&Score> {
        match self {
            ScoreOutcome::Scored(s) => Some(s),
            ScoreOutcome::Ineligible(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerScore {
    pub ticker: String,
    pub outcome: ScoreOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalEngine {
    pub lookback_momentum: usize,
    pub lookback_volatility: usize,
}

impl SignalEngine {
    pub fn new(lookback_momentum: usize, lookback_volatility: usize) -> Self {
        SignalEngine {
            lookback_momentum,
            lookback_volatility,
        }
    }

    /// First trading index at which a full score can exist.
    pub fn warmup(&self) -> usize {
        self.lookback_momentum.max(self.lookback_volatility)
    }

    pub fn score(&self, prices: &PriceTable, ticker: &str, index: usize) -> ScoreOutcome {
        let (Some(column), Some(date)) = (prices.column(ticker), prices.date_at(index)) else {
            return ScoreOutcome::Ineligible(IneligibleReason::MissingPrice);
        };
        if index < self.lookback_momentum || index < self.lookback_volatility {
            return ScoreOutcome::Ineligible(IneligibleReason::InsufficientHistory);
        }

        let (Some(now), Some(then)) = (column[index], column[index - self.lookback_momentum])
        else {
            return ScoreOutcome::Ineligible(IneligibleReason::InsufficientHistory);
        };
        let momentum = now / then - 1.0;

        let window = &column[index - self.lookback_volatility..=index];
        let Some(volatility) = return_stddev(window) else {
            return ScoreOutcome::Ineligible(IneligibleReason::InsufficientHistory);
        };

        if !momentum.is_finite() || !volatility.is_finite() {
            return ScoreOutcome::Ineligible(IneligibleReason::NonFinite);
        }
        if volatility <= 0.0 {
            return ScoreOutcome::Ineligible(IneligibleReason::ZeroVolatility);
        }
        let ratio = momentum / volatility;
        if !ratio.is_finite() {
            return ScoreOutcome::Ineligible(IneligibleReason::NonFinite);
        }

        ScoreOutcome::Scored(Score {
            date,
            momentum,
            volatility,
            ratio,
        })
    }

    /// Scores every ticker on `index`. Output order follows `tickers`.
    pub fn score_all(&self, prices: &PriceTable, tickers: &[String], index: usize) -> Vec<TickerScore> {
        tickers
            .par_iter()
            .map(|ticker| TickerScore {
                ticker: ticker.clone(),
                outcome: self.score(prices, ticker, index),
            })
            .collect()
    }
}

/// Sample standard deviation of simple returns over a window of prices.
/// `None` when the window has a gap or fewer than two returns.
fn return_stddev(window: &[Option<f64>]) -> Option<f64> {
    let mut returns = Vec::with_capacity(window.len().saturating_sub(1));
    for pair in window.windows(2) {
        let (prev, curr) = (pair[0]?, pair[1]?);
        returns.push(curr / prev - 1.0);
    }
    if returns.len() < 2 {
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
