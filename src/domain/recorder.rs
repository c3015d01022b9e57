//! Append-only record of a backtest run.

use chrono::NaiveDate;

use super::portfolio::{AccountState, EquityPoint};
use super::position::{RoundTrip, Trade};
use super::selector::TargetAllocation;
use super::simulator::StepOutcome;

/// What happened on one rebalance day.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceRecord {
    pub date: NaiveDate,
    pub allocation: TargetAllocation,
    pub liquidated: usize,
    pub entered: usize,
    /// Targets that could not afford a single share.
    pub unfilled: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub snapshots: Vec<AccountState>,
    pub trades: Vec<Trade>,
    pub round_trips: Vec<RoundTrip>,
    pub rebalances: Vec<RebalanceRecord>,
}

impl BacktestResult {
    pub fn equity_curve(&self) -> Vec<EquityPoint> {
        self.snapshots
            .iter()
            .filter_map(AccountState::equity_point)
            .collect()
    }

    pub fn total_commissions(&self) -> f64 {
        self.trades.iter().map(|t| t.commission).sum()
    }

    pub fn final_state(&self) -> Option<&AccountState> {
        self.snapshots.last()
    }

    pub fn final_equity(&self) -> f64 {
        self.final_state()
            .map(|s| s.equity)
            .unwrap_or(self.initial_capital)
    }
}

pub struct ResultRecorder {
    result: BacktestResult,
}

impl ResultRecorder {
    pub fn new(initial_capital: f64) -> Self {
        ResultRecorder {
            result: BacktestResult {
                initial_capital,
                snapshots: Vec::new(),
                trades: Vec::new(),
                round_trips: Vec::new(),
                rebalances: Vec::new(),
            },
        }
    }

    pub fn record(&mut self, outcome: StepOutcome) {
        self.result.snapshots.push(outcome.state);
        self.result.trades.extend(outcome.trades);
        self.result.round_trips.extend(outcome.round_trips);
        if let Some(rebalance) = outcome.rebalance {
            self.result.rebalances.push(rebalance);
        }
    }

    pub fn days_recorded(&self) -> usize {
        self.result.snapshots.len()
    }

    pub fn finish(self) -> BacktestResult {
        self.result
    }
}
