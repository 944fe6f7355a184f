//! Configuration validation.
//!
//! Checks INI values key by key before any provider is contacted. Numeric
//! keys are parsed strictly here: a malformed number is an error rather than
//! a silent fallback to the default.

use crate::domain::error::StocksimError;
use crate::domain::strategy::{presets, EntryRule, ExitRule};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const PROVIDERS: [&str; 2] = ["csv", "yahoo"];

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    let provider = provider_name(config);
    if !PROVIDERS.contains(&provider.as_str()) {
        return Err(StocksimError::invalid(
            "provider",
            format!("unknown provider '{provider}' (known: {})", PROVIDERS.join(", ")),
        ));
    }
    if provider == "csv" {
        require_non_empty(config, "data", "csv_dir")?;
    }
    Ok(())
}

/// Window checks only. `[backtest] tickers` is a default the command line
/// may replace, so its presence is checked once tickers are resolved.
pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    validate_dates(config)
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    if let Some(name) = config.get_string("strategy", "preset") {
        presets::by_name(&name)?;
    }
    if let Some(rule) = config.get_string("strategy", "entry_rule") {
        rule.parse::<EntryRule>()?;
    }
    if let Some(rule) = config.get_string("strategy", "exit_rule") {
        rule.parse::<ExitRule>()?;
    }
    for key in [
        "entry_threshold",
        "exit_gain_threshold",
        "exit_loss_threshold",
        "starting_cash",
    ] {
        parse_number(config, "strategy", key)?;
    }
    for key in [
        "rsi_period",
        "price_drop_days",
        "min_hold_bars",
        "sma_short_period",
        "sma_long_period",
        "volume_window",
    ] {
        parse_count(config, "strategy", key)?;
    }
    Ok(())
}

pub fn validate_advisor_config(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    for key in ["fundamental_weight", "technical_weight", "buy_at", "sell_at"] {
        parse_number(config, "advisor", key)?;
    }
    Ok(())
}

/// Lowercased `[data] provider`, `csv` when unset.
pub fn provider_name(config: &dyn ConfigPort) -> String {
    config
        .get_string("data", "provider")
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "csv".to_string())
}

/// Parse an optional floating point key. Absent keys yield `None`.
pub fn parse_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, StocksimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| {
                StocksimError::invalid(key, format!("'{raw}' is not a number in [{section}]"))
            }),
    }
}

/// Parse an optional non-negative integer key. Absent keys yield `None`.
pub fn parse_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<usize>, StocksimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<usize>().map(Some).map_err(|_| {
            StocksimError::invalid(
                key,
                format!("'{raw}' is not a non-negative integer in [{section}]"),
            )
        }),
    }
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, StocksimError> {
    match value {
        None => Err(StocksimError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            StocksimError::invalid(field, format!("invalid {field} format, expected YYYY-MM-DD"))
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), StocksimError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(StocksimError::invalid(
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}

fn require_non_empty(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), StocksimError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(StocksimError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}
