//! Day-by-day portfolio simulation.
//!
//! Each trading day runs, in order: stop-loss checks, rebalance detection,
//! liquidation, re-entry from fresh rankings and the end-of-day equity
//! mark. [`step`] is pure; [`Simulator`] owns the account and only commits
//! a day once every stage of it has succeeded.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::commission::CommissionModel;
use super::error::TitanError;
use super::execution::{self, EntryResult};
use super::portfolio::{AccountState, Phase};
use super::position::{RoundTrip, Trade};
use super::price_table::PriceTable;
use super::recorder::{BacktestResult, RebalanceRecord, ResultRecorder};
use super::schedule::RebalanceWeekday;
use super::selector::{self, SelectionParams};
use super::signal::SignalEngine;
use super::universe::CategoryMap;

/// Immutable inputs shared by every day of a run.
#[derive(Debug, Clone)]
pub struct EngineContext<'a> {
    pub prices: &'a PriceTable,
    pub categories: &'a CategoryMap,
    pub signal: SignalEngine,
    pub selection: SelectionParams,
    pub commission: CommissionModel,
    pub stop_loss_pct: f64,
    pub rebalance_weekday: RebalanceWeekday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketDay {
    pub index: usize,
    pub date: NaiveDate,
    pub previous: Option<NaiveDate>,
}

impl MarketDay {
    pub fn at(prices: &PriceTable, index: usize) -> Option<Self> {
        let date = prices.date_at(index)?;
        let previous = index.checked_sub(1).and_then(|i| prices.date_at(i));
        Some(MarketDay {
            index,
            date,
            previous,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: AccountState,
    pub trades: Vec<Trade>,
    pub round_trips: Vec<RoundTrip>,
    pub rebalance: Option<RebalanceRecord>,
}

/// Advances `state` through one trading day.
pub fn step(
    state: &AccountState,
    day: &MarketDay,
    ctx: &EngineContext<'_>,
) -> Result<StepOutcome, TitanError> {
    let prices = ctx.prices;
    let mut account = state.clone();
    account.date = Some(day.date);

    let mut trades = Vec::new();
    let mut round_trips = Vec::new();

    let stops = execution::check_stop_losses(
        &mut account,
        prices,
        day.index,
        ctx.stop_loss_pct,
        &ctx.commission,
    )?;
    for exit in stops {
        info!(
            date = %day.date,
            ticker = %exit.trade.ticker,
            price = exit.trade.price,
            entry_price = exit.round_trip.entry_price,
            "stop-loss exit"
        );
        trades.push(exit.trade);
        round_trips.push(exit.round_trip);
    }

    let mut rebalance = None;
    if ctx
        .rebalance_weekday
        .is_rebalance_day(day.previous, day.date)
    {
        account.phase = Phase::RebalancePending;
        rebalance = Some(rebalance_day(
            &mut account,
            day,
            ctx,
            &mut trades,
            &mut round_trips,
        )?);
    }

    account.equity = account.mark_to_market(prices, day.index)?;
    account.phase = account.resting_phase();

    Ok(StepOutcome {
        state: account,
        trades,
        round_trips,
        rebalance,
    })
}

fn rebalance_day(
    account: &mut AccountState,
    day: &MarketDay,
    ctx: &EngineContext<'_>,
    trades: &mut Vec<Trade>,
    round_trips: &mut Vec<RoundTrip>,
) -> Result<RebalanceRecord, TitanError> {
    let prices = ctx.prices;

    account.phase = Phase::Liquidating;
    let exits = execution::liquidate_all(account, prices, day.index, &ctx.commission)?;
    let liquidated = exits.len();
    for exit in exits {
        trades.push(exit.trade);
        round_trips.push(exit.round_trip);
    }

    let universe: Vec<String> = ctx
        .categories
        .tickers()
        .into_iter()
        .filter(|t| prices.has_ticker(t))
        .collect();
    let scores = ctx.signal.score_all(prices, &universe, day.index);
    let allocation = selector::select(day.date, &scores, ctx.categories, &ctx.selection);

    let mut targets = Vec::with_capacity(allocation.len());
    for entry in &allocation.entries {
        targets.push((entry, prices.require_price(&entry.asset.ticker, day.index)?));
    }

    let deployable = account.cash;
    let mut entered = 0;
    let mut unfilled = Vec::new();
    for (entry, price) in targets {
        let budget = deployable * entry.weight;
        match execution::enter(account, &entry.asset, price, day.date, budget, &ctx.commission) {
            EntryResult::Entered(trade) => {
                entered += 1;
                trades.push(trade);
            }
            EntryResult::InsufficientCapital => {
                debug!(
                    date = %day.date,
                    ticker = %entry.asset.ticker,
                    budget,
                    price,
                    "target left unfilled"
                );
                unfilled.push(entry.asset.ticker.clone());
            }
        }
    }

    debug!(
        date = %day.date,
        liquidated,
        selected = allocation.len(),
        entered,
        cash = account.cash,
        "rebalanced"
    );

    Ok(RebalanceRecord {
        date: day.date,
        allocation,
        liquidated,
        entered,
        unfilled,
    })
}

/// Owns the account sequence for a run.
pub struct Simulator<'a> {
    ctx: EngineContext<'a>,
    state: AccountState,
    next_index: usize,
}

impl<'a> Simulator<'a> {
    /// The first simulated day is the first with a full lookback window.
    pub fn new(ctx: EngineContext<'a>, initial_capital: f64) -> Self {
        let next_index = ctx.signal.warmup();
        Simulator {
            ctx,
            state: AccountState::new(initial_capital),
            next_index,
        }
    }

    /// Last successfully committed state.
    pub fn current(&self) -> &AccountState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.next_index >= self.ctx.prices.len()
    }

    /// Simulates the next trading day. `Ok(None)` once the timeline is
    /// exhausted. On error nothing is committed.
    pub fn advance(&mut self) -> Result<Option<StepOutcome>, TitanError> {
        let Some(day) = MarketDay::at(self.ctx.prices, self.next_index) else {
            return Ok(None);
        };
        let outcome = step(&self.state, &day, &self.ctx)?;
        self.state = outcome.state.clone();
        self.next_index += 1;
        Ok(Some(outcome))
    }
}

/// Runs a full backtest over the context's price table.
pub fn run_backtest(
    ctx: EngineContext<'_>,
    initial_capital: f64,
) -> Result<BacktestResult, TitanError> {
    info!(
        days = ctx.prices.len(),
        warmup = ctx.signal.warmup(),
        universe = ctx.categories.len(),
        initial_capital,
        "starting backtest"
    );

    let mut simulator = Simulator::new(ctx, initial_capital);
    let mut recorder = ResultRecorder::new(initial_capital);

    while let Some(outcome) = simulator.advance()? {
        recorder.record(outcome);
    }

    let result = recorder.finish();
    info!(
        days = result.snapshots.len(),
        trades = result.trades.len(),
        rebalances = result.rebalances.len(),
        final_equity = result.final_equity(),
        "backtest complete"
    );
    Ok(result)
}
