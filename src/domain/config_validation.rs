//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::commission::parse_tiers;
use crate::domain::error::TitanError;
use crate::domain::schedule::RebalanceWeekday;
use crate::domain::universe::CategoryMap;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const BACKTEST_SECTION: &str = "backtest";
pub const COMMISSION_SECTION: &str = "commission";

/// Roughly forty years of trading days.
pub const MAX_LOOKBACK_DAYS: usize = 10_000;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TitanError> {
    validate_initial_capital(config)?;
    validate_lookbacks(config)?;
    validate_top_n(config)?;
    validate_max_category_weight(config)?;
    validate_stop_loss(config)?;
    validate_rebalance_weekday(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_commission_config(config: &dyn ConfigPort) -> Result<(), TitanError> {
    for key in ["min_fee", "max_pct"] {
        let value = read_f64(config, COMMISSION_SECTION, key, 0.0)?;
        if !(value >= 0.0) || !value.is_finite() {
            return Err(TitanError::config_invalid(
                COMMISSION_SECTION,
                key,
                format!("{} must be a finite non-negative number", key),
            ));
        }
    }
    if let Some(tiers) = config.get_string(COMMISSION_SECTION, "tiers") {
        parse_tiers(&tiers)
            .map_err(|e| TitanError::config_invalid(COMMISSION_SECTION, "tiers", e.to_string()))?;
    }
    Ok(())
}

pub fn validate_universe_config(config: &dyn ConfigPort) -> Result<(), TitanError> {
    CategoryMap::from_config(config)?;
    Ok(())
}

/// Every check a run needs before any data is loaded.
pub fn validate_all(config: &dyn ConfigPort) -> Result<(), TitanError> {
    validate_backtest_config(config)?;
    validate_commission_config(config)?;
    validate_universe_config(config)?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TitanError> {
    let value = read_f64(config, BACKTEST_SECTION, "initial_capital", 100_000.0)?;
    if !(value > 0.0) || !value.is_finite() {
        return Err(TitanError::config_invalid(
            BACKTEST_SECTION,
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_lookbacks(config: &dyn ConfigPort) -> Result<(), TitanError> {
    for (key, default, minimum) in [
        ("lookback_momentum_days", 90, 1),
        ("lookback_volatility_days", 30, 2),
    ] {
        let value = read_usize(config, BACKTEST_SECTION, key, default)?;
        if value < minimum {
            return Err(TitanError::config_invalid(
                BACKTEST_SECTION,
                key,
                format!("{} must be at least {}", key, minimum),
            ));
        }
        if value > MAX_LOOKBACK_DAYS {
            return Err(TitanError::config_invalid(
                BACKTEST_SECTION,
                key,
                format!("{} must be at most {}", key, MAX_LOOKBACK_DAYS),
            ));
        }
    }
    Ok(())
}

fn validate_top_n(config: &dyn ConfigPort) -> Result<(), TitanError> {
    if read_usize(config, BACKTEST_SECTION, "top_n", 25)? < 1 {
        return Err(TitanError::config_invalid(
            BACKTEST_SECTION,
            "top_n",
            "top_n must be at least 1",
        ));
    }
    Ok(())
}

fn validate_max_category_weight(config: &dyn ConfigPort) -> Result<(), TitanError> {
    let value = read_f64(config, BACKTEST_SECTION, "max_category_weight", 0.35)?;
    if !(value > 0.0 && value <= 1.0) {
        return Err(TitanError::config_invalid(
            BACKTEST_SECTION,
            "max_category_weight",
            "max_category_weight must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), TitanError> {
    let value = read_f64(config, BACKTEST_SECTION, "stop_loss_pct", -0.07)?;
    if !(value > -1.0 && value < 0.0) {
        return Err(TitanError::config_invalid(
            BACKTEST_SECTION,
            "stop_loss_pct",
            "stop_loss_pct must be a negative fraction above -1",
        ));
    }
    Ok(())
}

fn validate_rebalance_weekday(config: &dyn ConfigPort) -> Result<(), TitanError> {
    read_weekday(config)?;
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), TitanError> {
    let value = read_f64(config, BACKTEST_SECTION, "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&value) {
        return Err(TitanError::config_invalid(
            BACKTEST_SECTION,
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TitanError> {
    let start_date = read_date(config, "start_date")?;
    let end_date = read_date(config, "end_date")?;

    if start_date >= end_date {
        return Err(TitanError::config_invalid(
            BACKTEST_SECTION,
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

/// A present but unparseable value is an error, not a silent default.
pub(crate) fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TitanError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| TitanError::config_invalid(section, key, format!("'{}' is not a number", s))),
    }
}

pub(crate) fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TitanError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => s.trim().parse::<usize>().map_err(|_| {
            TitanError::config_invalid(section, key, format!("'{}' is not a non-negative integer", s))
        }),
    }
}

pub(crate) fn read_date(config: &dyn ConfigPort, field: &str) -> Result<NaiveDate, TitanError> {
    match config.get_string(BACKTEST_SECTION, field) {
        None => Err(TitanError::ConfigMissing {
            section: BACKTEST_SECTION.to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            TitanError::config_invalid(
                BACKTEST_SECTION,
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

pub(crate) fn read_weekday(config: &dyn ConfigPort) -> Result<RebalanceWeekday, TitanError> {
    match config.get_string(BACKTEST_SECTION, "rebalance_weekday") {
        None => Ok(RebalanceWeekday::default()),
        Some(s) => s.parse::<RebalanceWeekday>().map_err(|e| {
            TitanError::config_invalid(BACKTEST_SECTION, "rebalance_weekday", e.to_string())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const DATES: &str = "start_date = 2020-01-01\nend_date = 2024-12-31\n";

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn backtest_with(line: &str) -> FileConfigAdapter {
        make_config(&format!("[backtest]\n{}{}\n", DATES, line))
    }

    fn invalid_key(err: TitanError) -> String {
        match err {
            TitanError::ConfigInvalid { key, .. } => key,
            other => panic!("Expected ConfigInvalid, got {:?}", other),
        }
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 100000.0
start_date = 2020-01-01
end_date = 2024-12-31
lookback_momentum_days = 90
lookback_volatility_days = 30
top_n = 25
max_category_weight = 0.35
stop_loss_pct = -0.07
rebalance_weekday = friday
risk_free_rate = 0.0
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn defaults_only_need_dates() {
        assert!(validate_backtest_config(&backtest_with("")).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let err = validate_backtest_config(&backtest_with("initial_capital = 0")).unwrap_err();
        assert_eq!(invalid_key(err), "initial_capital");
        let err = validate_backtest_config(&backtest_with("initial_capital = -100")).unwrap_err();
        assert_eq!(invalid_key(err), "initial_capital");
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let err = validate_backtest_config(&backtest_with("initial_capital = lots")).unwrap_err();
        assert_eq!(invalid_key(err), "initial_capital");
    }

    #[test]
    fn negative_lookback_is_rejected() {
        let err =
            validate_backtest_config(&backtest_with("lookback_momentum_days = -5")).unwrap_err();
        assert_eq!(invalid_key(err), "lookback_momentum_days");
        let err =
            validate_backtest_config(&backtest_with("lookback_momentum_days = 0")).unwrap_err();
        assert_eq!(invalid_key(err), "lookback_momentum_days");
    }

    #[test]
    fn volatility_window_needs_two_returns() {
        let err =
            validate_backtest_config(&backtest_with("lookback_volatility_days = 1")).unwrap_err();
        assert_eq!(invalid_key(err), "lookback_volatility_days");
    }

    #[test]
    fn oversized_lookback_is_rejected() {
        let err = validate_backtest_config(&backtest_with(
            "lookback_momentum_days = 18446744073709551615",
        ))
        .unwrap_err();
        assert_eq!(invalid_key(err), "lookback_momentum_days");

        let err =
            validate_backtest_config(&backtest_with("lookback_volatility_days = 10001")).unwrap_err();
        assert_eq!(invalid_key(err), "lookback_volatility_days");

        assert!(validate_backtest_config(&backtest_with("lookback_momentum_days = 10000")).is_ok());
    }

    #[test]
    fn top_n_zero_fails() {
        let err = validate_backtest_config(&backtest_with("top_n = 0")).unwrap_err();
        assert_eq!(invalid_key(err), "top_n");
    }

    #[test]
    fn category_weight_outside_unit_interval_fails() {
        for value in ["0", "1.5", "-0.2"] {
            let line = format!("max_category_weight = {}", value);
            let err = validate_backtest_config(&backtest_with(&line)).unwrap_err();
            assert_eq!(invalid_key(err), "max_category_weight");
        }
        assert!(validate_backtest_config(&backtest_with("max_category_weight = 1.0")).is_ok());
    }

    #[test]
    fn stop_loss_must_be_negative_fraction() {
        for value in ["0.07", "0", "-1.0"] {
            let line = format!("stop_loss_pct = {}", value);
            let err = validate_backtest_config(&backtest_with(&line)).unwrap_err();
            assert_eq!(invalid_key(err), "stop_loss_pct");
        }
    }

    #[test]
    fn unknown_weekday_fails() {
        let err = validate_backtest_config(&backtest_with("rebalance_weekday = sunday")).unwrap_err();
        assert_eq!(invalid_key(err), "rebalance_weekday");
    }

    #[test]
    fn risk_free_rate_range() {
        let err = validate_backtest_config(&backtest_with("risk_free_rate = 1.5")).unwrap_err();
        assert_eq!(invalid_key(err), "risk_free_rate");
    }

    #[test]
    fn missing_start_date() {
        let config = make_config("[backtest]\nend_date = 2024-12-31\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, TitanError::ConfigMissing { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config("[backtest]\nstart_date = 2025-01-01\nend_date = 2024-12-31\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "start_date");
    }

    #[test]
    fn bad_date_format() {
        let config = make_config("[backtest]\nstart_date = 01/01/2020\nend_date = 2024-12-31\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "start_date");
    }

    #[test]
    fn commission_values_must_be_non_negative() {
        let config = make_config("[commission]\nmin_fee = -1\n");
        let err = validate_commission_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "min_fee");

        let config = make_config("[commission]\nmax_pct = -0.01\n");
        let err = validate_commission_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "max_pct");
    }

    #[test]
    fn commission_values_must_be_finite() {
        for (key, value) in [
            ("max_pct", "nan"),
            ("max_pct", "inf"),
            ("min_fee", "NaN"),
            ("min_fee", "infinity"),
        ] {
            let config = make_config(&format!("[commission]\n{} = {}\n", key, value));
            let err = validate_commission_config(&config).unwrap_err();
            assert_eq!(invalid_key(err), key);
        }
    }

    #[test]
    fn commission_tiers_are_parsed() {
        let config = make_config("[commission]\ntiers = 100:0.01,*:0.005\n");
        assert!(validate_commission_config(&config).is_ok());

        let config = make_config("[commission]\ntiers = *:0.01,100:0.005\n");
        let err = validate_commission_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "tiers");
    }

    #[test]
    fn universe_with_conflicting_ticker_fails() {
        let config = make_config("[universe]\ncommodities = GLD, LIT\naggressive_growth = LIT\n");
        let err = validate_universe_config(&config).unwrap_err();
        assert!(matches!(err, TitanError::ConfigInvalid { section, .. } if section == "universe"));
    }

    #[test]
    fn validate_all_checks_every_section() {
        let config = make_config(&format!(
            "[backtest]\n{}\n[commission]\nmin_fee = 1.0\n[universe]\ncrypto = IBIT\n",
            DATES
        ));
        assert!(validate_all(&config).is_ok());

        let config = make_config(&format!("[backtest]\n{}\n", DATES));
        assert!(validate_all(&config).is_err());
    }
}
