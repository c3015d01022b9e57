//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for titan.
#[derive(Debug, thiserror::Error)]
pub enum TitanError {
    #[error("missing price for {ticker} on {date}")]
    MissingPrice { ticker: String, date: NaiveDate },

    #[error("invalid price {value} for {ticker} on {date}")]
    InvalidPrice {
        ticker: String,
        date: NaiveDate,
        value: f64,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient data for {ticker}: have {bars} prices, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TitanError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TitanError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            TitanError::MissingPrice { .. }
                | TitanError::InvalidPrice { .. }
                | TitanError::Data { .. }
                | TitanError::NoData { .. }
                | TitanError::InsufficientData { .. }
        )
    }
}

impl From<&TitanError> for std::process::ExitCode {
    fn from(err: &TitanError) -> Self {
        let code: u8 = match err {
            TitanError::Io(_) | TitanError::Csv(_) => 1,
            TitanError::ConfigParse { .. }
            | TitanError::ConfigMissing { .. }
            | TitanError::ConfigInvalid { .. } => 2,
            TitanError::MissingPrice { .. }
            | TitanError::InvalidPrice { .. }
            | TitanError::Data { .. }
            | TitanError::NoData { .. }
            | TitanError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
