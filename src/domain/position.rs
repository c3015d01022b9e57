//! Open positions, trade records and closed round trips.

use crate::domain::asset::Category;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: String,
    pub category: Category,
    pub shares: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub entry_commission: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn return_since_entry(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.entry_price)
    }

    /// `stop_loss_pct` is a negative fraction, e.g. -0.07.
    pub fn should_stop_loss(&self, price: f64, stop_loss_pct: f64) -> bool {
        self.return_since_entry(price) <= stop_loss_pct
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeReason {
    Entry,
    StopLoss,
    Rebalance,
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeReason::Entry => f.write_str("entry"),
            TradeReason::StopLoss => f.write_str("stop_loss"),
            TradeReason::Rebalance => f.write_str("rebalance"),
        }
    }
}

/// One executed order. Never mutated after it is logged.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub ticker: String,
    pub side: Side,
    pub shares: u64,
    pub price: f64,
    pub commission: f64,
    pub reason: TradeReason,
}

impl Trade {
    pub fn notional(&self) -> f64 {
        self.shares as f64 * self.price
    }

    /// Signed cash effect: proceeds net of fees for sells, outlay plus
    /// fees (negative) for buys.
    pub fn cash_flow(&self) -> f64 {
        match self.side {
            Side::Buy => -(self.notional() + self.commission),
            Side::Sell => self.notional() - self.commission,
        }
    }
}

/// A closed position from entry to exit.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub ticker: String,
    pub category: Category,
    pub shares: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub commission: f64,
    pub pnl: f64,
    pub exit_reason: TradeReason,
}
