//! CSV report adapter implementing ReportPort.
//!
//! Writes `equity.csv`, `trades.csv`, `positions.csv`, `round_trips.csv`
//! and `metrics.csv` into the output directory. Floats use shortest
//! round-trip formatting, so every logged value parses back to the same
//! `f64`.

use std::fs;
use std::path::Path;

use crate::domain::error::TitanError;
use crate::domain::metrics::Metrics;
use crate::domain::recorder::BacktestResult;
use crate::ports::report_port::ReportPort;

pub const EQUITY_FILE: &str = "equity.csv";
pub const TRADES_FILE: &str = "trades.csv";
pub const POSITIONS_FILE: &str = "positions.csv";
pub const ROUND_TRIPS_FILE: &str = "round_trips.csv";
pub const METRICS_FILE: &str = "metrics.csv";

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

fn write_equity(result: &BacktestResult, path: &Path) -> Result<(), TitanError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["date", "cash", "equity", "positions"])?;
    for snapshot in &result.snapshots {
        let Some(date) = snapshot.date else { continue };
        wtr.write_record([
            date.to_string(),
            snapshot.cash.to_string(),
            snapshot.equity.to_string(),
            snapshot.position_count().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), TitanError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "date",
        "ticker",
        "side",
        "shares",
        "price",
        "commission",
        "reason",
    ])?;
    for trade in &result.trades {
        wtr.write_record([
            trade.date.to_string(),
            trade.ticker.clone(),
            trade.side.to_string(),
            trade.shares.to_string(),
            trade.price.to_string(),
            trade.commission.to_string(),
            trade.reason.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_positions(result: &BacktestResult, path: &Path) -> Result<(), TitanError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "date",
        "ticker",
        "category",
        "shares",
        "entry_price",
        "entry_date",
    ])?;
    for snapshot in &result.snapshots {
        let Some(date) = snapshot.date else { continue };
        for position in snapshot.positions.values() {
            wtr.write_record([
                date.to_string(),
                position.ticker.clone(),
                position.category.config_key().to_string(),
                position.shares.to_string(),
                position.entry_price.to_string(),
                position.entry_date.to_string(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn write_round_trips(result: &BacktestResult, path: &Path) -> Result<(), TitanError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "ticker",
        "category",
        "shares",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "commission",
        "pnl",
        "exit_reason",
    ])?;
    for trip in &result.round_trips {
        wtr.write_record([
            trip.ticker.clone(),
            trip.category.config_key().to_string(),
            trip.shares.to_string(),
            trip.entry_date.to_string(),
            trip.entry_price.to_string(),
            trip.exit_date.to_string(),
            trip.exit_price.to_string(),
            trip.commission.to_string(),
            trip.pnl.to_string(),
            trip.exit_reason.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_metrics(metrics: &Metrics, path: &Path) -> Result<(), TitanError> {
    let rows: [(&str, String); 14] = [
        ("initial_capital", metrics.initial_capital.to_string()),
        ("final_equity", metrics.final_equity.to_string()),
        ("total_return", metrics.total_return.to_string()),
        ("annualized_return", metrics.annualized_return.to_string()),
        ("annualized_volatility", metrics.annualized_volatility.to_string()),
        ("sharpe_ratio", metrics.sharpe_ratio.to_string()),
        ("sortino_ratio", metrics.sortino_ratio.to_string()),
        ("max_drawdown", metrics.max_drawdown.to_string()),
        ("max_drawdown_duration", metrics.max_drawdown_duration.to_string()),
        ("total_commissions", metrics.total_commissions.to_string()),
        ("total_trades", metrics.total_trades.to_string()),
        ("rebalances", metrics.rebalances.to_string()),
        ("stop_loss_exits", metrics.stop_loss_exits.to_string()),
        ("win_rate", metrics.win_rate.to_string()),
    ];

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["metric", "value"])?;
    for (name, value) in rows {
        wtr.write_record([name, value.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &Metrics,
        output_dir: &Path,
    ) -> Result<(), TitanError> {
        fs::create_dir_all(output_dir)?;
        write_equity(result, &output_dir.join(EQUITY_FILE))?;
        write_trades(result, &output_dir.join(TRADES_FILE))?;
        write_positions(result, &output_dir.join(POSITIONS_FILE))?;
        write_round_trips(result, &output_dir.join(ROUND_TRIPS_FILE))?;
        write_metrics(metrics, &output_dir.join(METRICS_FILE))?;
        Ok(())
    }
}
