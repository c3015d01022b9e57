//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::{DATA_SECTION, RunConfig};
use crate::domain::config_validation::validate_all;
use crate::domain::error::TitanError;
use crate::domain::metrics::Metrics;
use crate::domain::recorder::BacktestResult;
use crate::domain::simulator::{self, EngineContext};
use crate::domain::universe::{self, CategoryMap};
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_OUTPUT_DIR: &str = "titan-report";

#[derive(Parser, Debug)]
#[command(name = "titan", about = "Momentum/volatility rotation backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of <TICKER>.csv files, overrides [data] directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data_dir,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, data_dir.as_deref())
            } else {
                run_backtest(&config, data_dir.as_deref(), output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TitanError> {
    FileConfigAdapter::from_file(path).map_err(|e| TitanError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn run_backtest(
    config_path: &Path,
    data_dir: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), TitanError> {
    info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;
    let run = RunConfig::from_config(&adapter)?;

    let data_dir = resolve_data_dir(data_dir, &run)?;
    info!(dir = %data_dir.display(), "reading prices");
    let data_port = CsvAdapter::new(data_dir);

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let (_, metrics) = run_backtest_pipeline(&data_port, &run, &CsvReportAdapter::new(), &output)?;
    print_summary(&run, &metrics);
    println!("\nReport written to: {}", output.display());
    Ok(())
}

pub fn resolve_data_dir(cli_dir: Option<&Path>, run: &RunConfig) -> Result<PathBuf, TitanError> {
    cli_dir
        .map(Path::to_path_buf)
        .or_else(|| run.backtest.data_dir.clone())
        .ok_or_else(|| TitanError::ConfigMissing {
            section: DATA_SECTION.to_string(),
            key: "directory".to_string(),
        })
}

/// Loads prices, simulates and writes the report.
pub fn run_backtest_pipeline(
    data_port: &dyn PriceDataPort,
    run: &RunConfig,
    report: &dyn ReportPort,
    output: &Path,
) -> Result<(BacktestResult, Metrics), TitanError> {
    let bt = &run.backtest;

    let alignment = universe::load_prices(
        data_port,
        &run.universe,
        bt.start_date,
        bt.end_date,
        bt.min_history(),
    )?;
    let categories = run.universe.restrict_to(&alignment.table);

    let ctx = EngineContext {
        prices: &alignment.table,
        categories: &categories,
        signal: bt.signal_engine(),
        selection: bt.selection_params(),
        commission: bt.commission.clone(),
        stop_loss_pct: bt.stop_loss_pct,
        rebalance_weekday: bt.rebalance_weekday,
    };
    let result = simulator::run_backtest(ctx, bt.initial_capital)?;
    let metrics = Metrics::compute(&result, bt.risk_free_rate);

    report.write(&result, &metrics, output)?;
    info!(dir = %output.display(), "report written");

    Ok((result, metrics))
}

fn print_summary(run: &RunConfig, metrics: &Metrics) {
    println!("=== Titan Backtest ===");
    println!(
        "Period:           {} to {}",
        run.backtest.start_date, run.backtest.end_date
    );
    println!("Initial Capital:  ${:.2}", metrics.initial_capital);
    println!("Final Equity:     ${:.2}", metrics.final_equity);
    println!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    println!("Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    println!(
        "Annualized Vol:   {:.2}%",
        metrics.annualized_volatility * 100.0
    );
    println!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    println!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    println!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    println!("Total Trades:     {}", metrics.total_trades);
    println!("Rebalances:       {}", metrics.rebalances);
    println!("Stop-loss Exits:  {}", metrics.stop_loss_exits);
    println!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    println!("Commissions:      ${:.2}", metrics.total_commissions);
    println!("Open Positions:   {}", metrics.open_positions);
}

/// Validates the config and, when a data directory resolves, reports
/// universe tickers without a price file.
pub fn run_dry_run(config_path: &Path, data_dir: Option<&Path>) -> Result<(), TitanError> {
    info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;
    let run = RunConfig::from_config(&adapter)?;
    let bt = &run.backtest;

    println!("Config validated successfully");
    println!("\nParameters:");
    println!("  period:              {} to {}", bt.start_date, bt.end_date);
    println!("  initial_capital:     {}", bt.initial_capital);
    println!(
        "  lookbacks:           momentum {}d, volatility {}d",
        bt.lookback_momentum_days, bt.lookback_volatility_days
    );
    println!("  top_n:               {}", bt.top_n);
    println!("  max_category_weight: {}", bt.max_category_weight);
    println!("  stop_loss_pct:       {}", bt.stop_loss_pct);
    println!("  rebalance:           every {}", bt.rebalance_weekday);

    print_universe(&run.universe);

    if let Ok(dir) = resolve_data_dir(data_dir, &run) {
        match universe::unavailable_tickers(&CsvAdapter::new(dir.clone()), &run.universe) {
            Ok(missing) if missing.is_empty() => {
                println!("\nPrice files: all present in {}", dir.display());
            }
            Ok(missing) => {
                warn!(
                    count = missing.len(),
                    dir = %dir.display(),
                    "universe tickers without price files"
                );
                println!(
                    "\nNo price file in {} for: {}",
                    dir.display(),
                    missing.join(", ")
                );
            }
            Err(e) => warn!(error = %e, dir = %dir.display(), "cannot list price files"),
        }
    }

    println!("\nDry run complete: configuration is valid");
    Ok(())
}

fn print_universe(map: &CategoryMap) {
    println!("\nUniverse ({} tickers):", map.len());
    for (category, count) in map.count_by_category() {
        let tickers: Vec<String> = map
            .tickers()
            .into_iter()
            .filter(|t| map.category_of(t) == Some(category))
            .collect();
        println!("  {} ({}): {}", category, count, tickers.join(", "));
    }
}

fn run_validate(config_path: &Path) -> Result<(), TitanError> {
    info!(path = %config_path.display(), "validating config");
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;
    let run = RunConfig::from_config(&adapter)?;
    println!(
        "Configuration is valid: {} tickers in {} categories.",
        run.universe.len(),
        run.universe.count_by_category().len()
    );
    Ok(())
}
