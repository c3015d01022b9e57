//! Result output port trait.

use crate::domain::error::TitanError;
use crate::domain::metrics::Metrics;
use crate::domain::recorder::BacktestResult;
use std::path::Path;

/// Port for persisting a finished backtest.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &Metrics,
        output_dir: &Path,
    ) -> Result<(), TitanError>;
}
