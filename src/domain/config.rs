//! Typed run configuration built from a [`ConfigPort`].

use crate::domain::commission::{CommissionModel, parse_tiers};
use crate::domain::config_validation::{
    self, BACKTEST_SECTION, COMMISSION_SECTION, read_date, read_f64, read_usize, read_weekday,
};
use crate::domain::error::TitanError;
use crate::domain::schedule::RebalanceWeekday;
use crate::domain::selector::SelectionParams;
use crate::domain::signal::SignalEngine;
use crate::domain::universe::CategoryMap;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::PathBuf;

pub const DATA_SECTION: &str = "data";

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub lookback_momentum_days: usize,
    pub lookback_volatility_days: usize,
    pub top_n: usize,
    pub max_category_weight: f64,
    pub stop_loss_pct: f64,
    pub rebalance_weekday: RebalanceWeekday,
    pub risk_free_rate: f64,
    pub commission: CommissionModel,
    pub data_dir: Option<PathBuf>,
}

impl BacktestConfig {
    /// Validates every section, then reads typed values.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TitanError> {
        config_validation::validate_backtest_config(config)?;
        config_validation::validate_commission_config(config)?;

        let defaults = CommissionModel::default();
        let tiers = match config.get_string(COMMISSION_SECTION, "tiers") {
            Some(s) => parse_tiers(&s)
                .map_err(|e| TitanError::config_invalid(COMMISSION_SECTION, "tiers", e.to_string()))?,
            None => defaults.tiers,
        };
        let commission = CommissionModel {
            tiers,
            min_fee: read_f64(config, COMMISSION_SECTION, "min_fee", defaults.min_fee)?,
            max_pct: read_f64(config, COMMISSION_SECTION, "max_pct", defaults.max_pct)?,
        };

        Ok(BacktestConfig {
            start_date: read_date(config, "start_date")?,
            end_date: read_date(config, "end_date")?,
            initial_capital: read_f64(config, BACKTEST_SECTION, "initial_capital", 100_000.0)?,
            lookback_momentum_days: read_usize(config, BACKTEST_SECTION, "lookback_momentum_days", 90)?,
            lookback_volatility_days: read_usize(
                config,
                BACKTEST_SECTION,
                "lookback_volatility_days",
                30,
            )?,
            top_n: read_usize(config, BACKTEST_SECTION, "top_n", 25)?,
            max_category_weight: read_f64(config, BACKTEST_SECTION, "max_category_weight", 0.35)?,
            stop_loss_pct: read_f64(config, BACKTEST_SECTION, "stop_loss_pct", -0.07)?,
            rebalance_weekday: read_weekday(config)?,
            risk_free_rate: read_f64(config, BACKTEST_SECTION, "risk_free_rate", 0.0)?,
            commission,
            data_dir: config
                .get_string(DATA_SECTION, "directory")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn signal_engine(&self) -> SignalEngine {
        SignalEngine::new(self.lookback_momentum_days, self.lookback_volatility_days)
    }

    pub fn selection_params(&self) -> SelectionParams {
        SelectionParams {
            top_n: self.top_n,
            max_category_weight: self.max_category_weight,
        }
    }

    /// Fewest observations a ticker needs to ever be scored.
    pub fn min_history(&self) -> usize {
        self.signal_engine().warmup().saturating_add(1)
    }
}

/// Run configuration together with its validated universe.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub backtest: BacktestConfig,
    pub universe: CategoryMap,
}

impl RunConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TitanError> {
        let backtest = BacktestConfig::from_config(config)?;
        let universe = CategoryMap::from_config(config)?;
        Ok(RunConfig { backtest, universe })
    }
}
