//! Order execution at the daily close.
//!
//! Entries buy whole shares only; exits always sell the full position.
//! Every executed order is charged through the [`CommissionModel`].

use chrono::NaiveDate;

use super::asset::Asset;
use super::commission::CommissionModel;
use super::error::TitanError;
use super::portfolio::AccountState;
use super::position::{Position, RoundTrip, Side, Trade, TradeReason};
use super::price_table::PriceTable;

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered(Trade),
    InsufficientCapital,
}

/// A sell together with the round trip it closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Exit {
    pub trade: Trade,
    pub round_trip: RoundTrip,
}

/// Whole shares affordable from `budget`, then reduced until
/// `shares * price + fee` fits in `cash`.
pub fn size_order(budget: f64, cash: f64, price: f64, model: &CommissionModel) -> u64 {
    if !(budget > 0.0) || !(cash > 0.0) || !(price > 0.0) {
        return 0;
    }
    let mut shares = (budget.min(cash) / price).floor() as u64;
    while shares > 0 && shares as f64 * price + model.fee(shares, price) > cash {
        shares -= 1;
    }
    shares
}

/// Buy `asset` with up to `budget` of the account's cash.
pub fn enter(
    account: &mut AccountState,
    asset: &Asset,
    price: f64,
    date: NaiveDate,
    budget: f64,
    model: &CommissionModel,
) -> EntryResult {
    let shares = size_order(budget, account.cash, price, model);
    if shares == 0 {
        return EntryResult::InsufficientCapital;
    }

    let cost = shares as f64 * price;
    let commission = model.fee(shares, price);
    account.cash -= cost + commission;

    account.add_position(Position {
        ticker: asset.ticker.clone(),
        category: asset.category,
        shares,
        entry_price: price,
        entry_date: date,
        entry_commission: commission,
    });

    EntryResult::Entered(Trade {
        date,
        ticker: asset.ticker.clone(),
        side: Side::Buy,
        shares,
        price,
        commission,
        reason: TradeReason::Entry,
    })
}

/// Sell the whole position in `ticker` at `price`.
pub fn exit_position(
    account: &mut AccountState,
    ticker: &str,
    price: f64,
    date: NaiveDate,
    reason: TradeReason,
    model: &CommissionModel,
) -> Option<Exit> {
    let position = account.remove_position(ticker)?;

    let proceeds = position.market_value(price);
    let commission = model.fee(position.shares, price);
    account.cash += proceeds - commission;

    let pnl = position.unrealized_pnl(price) - position.entry_commission - commission;

    Some(Exit {
        trade: Trade {
            date,
            ticker: position.ticker.clone(),
            side: Side::Sell,
            shares: position.shares,
            price,
            commission,
            reason,
        },
        round_trip: RoundTrip {
            ticker: position.ticker,
            category: position.category,
            shares: position.shares,
            entry_price: position.entry_price,
            exit_price: price,
            entry_date: position.entry_date,
            exit_date: date,
            commission: position.entry_commission + commission,
            pnl,
            exit_reason: reason,
        },
    })
}

/// Closes every position whose return since entry is at or below
/// `stop_loss_pct` at the close of trading index `index`.
///
/// Two passes: collect breached tickers, then exit them in ticker order.
pub fn check_stop_losses(
    account: &mut AccountState,
    prices: &PriceTable,
    index: usize,
    stop_loss_pct: f64,
    model: &CommissionModel,
) -> Result<Vec<Exit>, TitanError> {
    let date = prices.date_at(index).ok_or_else(|| TitanError::Data {
        reason: format!("trading index {} outside timeline", index),
    })?;

    let mut triggered: Vec<(String, f64)> = Vec::new();
    for position in account.positions.values() {
        let price = prices.require_price(&position.ticker, index)?;
        if position.should_stop_loss(price, stop_loss_pct) {
            triggered.push((position.ticker.clone(), price));
        }
    }

    Ok(triggered
        .into_iter()
        .filter_map(|(ticker, price)| {
            exit_position(account, &ticker, price, date, TradeReason::StopLoss, model)
        })
        .collect())
}

/// Sells every open position at the close of `index`.
pub fn liquidate_all(
    account: &mut AccountState,
    prices: &PriceTable,
    index: usize,
    model: &CommissionModel,
) -> Result<Vec<Exit>, TitanError> {
    let date = prices.date_at(index).ok_or_else(|| TitanError::Data {
        reason: format!("trading index {} outside timeline", index),
    })?;

    let mut quotes: Vec<(String, f64)> = Vec::with_capacity(account.position_count());
    for ticker in account.positions.keys() {
        quotes.push((ticker.clone(), prices.require_price(ticker, index)?));
    }

    Ok(quotes
        .into_iter()
        .filter_map(|(ticker, price)| {
            exit_position(account, &ticker, price, date, TradeReason::Rebalance, model)
        })
        .collect())
}
