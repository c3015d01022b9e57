//! Account state and equity marking.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::TitanError;
use super::position::Position;
use super::price_table::PriceTable;

/// Simulator phase at a point in the trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Holding,
    RebalancePending,
    Liquidating,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// End-of-day account snapshot.
///
/// `equity == cash + sum(shares * close)` over `positions`, summed in
/// ticker order.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    pub date: Option<NaiveDate>,
    pub cash: f64,
    pub positions: BTreeMap<String, Position>,
    pub equity: f64,
    pub phase: Phase,
}

impl AccountState {
    pub fn new(initial_capital: f64) -> Self {
        AccountState {
            date: None,
            cash: initial_capital,
            positions: BTreeMap::new(),
            equity: initial_capital,
            phase: Phase::Idle,
        }
    }

    pub fn add_position(&mut self, position: Position) {
        self.positions.insert(position.ticker.clone(), position);
    }

    pub fn get_position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    pub fn has_position(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn remove_position(&mut self, ticker: &str) -> Option<Position> {
        self.positions.remove(ticker)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn resting_phase(&self) -> Phase {
        if self.positions.is_empty() {
            Phase::Idle
        } else {
            Phase::Holding
        }
    }

    /// Cash plus positions marked at the closes of trading index `index`.
    pub fn mark_to_market(&self, prices: &PriceTable, index: usize) -> Result<f64, TitanError> {
        let mut equity = self.cash;
        for position in self.positions.values() {
            equity += position.market_value(prices.require_price(&position.ticker, index)?);
        }
        Ok(equity)
    }

    pub fn equity_point(&self) -> Option<EquityPoint> {
        self.date.map(|date| EquityPoint {
            date,
            equity: self.equity,
        })
    }
}
