//! Strategy configuration and named presets.
//!
//! A strategy is one entry rule and one exit rule plus their thresholds. Every
//! preset is just a `StrategyConfig` value; the simulator has a single code path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::StocksimError;
use crate::domain::indicator::IndicatorSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryRule {
    /// Enter when RSI falls below `entry_threshold`.
    RsiOversold,
    /// Enter when the close has moved by `entry_threshold` percent (negative)
    /// or more over the last `price_drop_days` days.
    PriceDropPct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitRule {
    /// Exit when RSI rises above `exit_gain_threshold`.
    RsiOverbought,
    /// Exit when the gain since entry reaches `exit_gain_threshold` percent.
    GainLossPct,
}

impl fmt::Display for EntryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryRule::RsiOversold => f.write_str("RSI_OVERSOLD"),
            EntryRule::PriceDropPct => f.write_str("PRICE_DROP_PCT"),
        }
    }
}

impl fmt::Display for ExitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitRule::RsiOverbought => f.write_str("RSI_OVERBOUGHT"),
            ExitRule::GainLossPct => f.write_str("GAIN_LOSS_PCT"),
        }
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_uppercase().replace('-', "_")
}

impl FromStr for EntryRule {
    type Err = StocksimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "RSI_OVERSOLD" => Ok(EntryRule::RsiOversold),
            "PRICE_DROP_PCT" => Ok(EntryRule::PriceDropPct),
            other => Err(StocksimError::invalid(
                "entry_rule",
                format!("unknown entry rule '{other}'"),
            )),
        }
    }
}

impl FromStr for ExitRule {
    type Err = StocksimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "RSI_OVERBOUGHT" => Ok(ExitRule::RsiOverbought),
            "GAIN_LOSS_PCT" => Ok(ExitRule::GainLossPct),
            other => Err(StocksimError::invalid(
                "exit_rule",
                format!("unknown exit rule '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub entry_rule: EntryRule,
    pub entry_threshold: f64,
    pub exit_rule: ExitRule,
    /// Percent gain target for `GainLossPct`, RSI level for `RsiOverbought`.
    pub exit_gain_threshold: f64,
    /// Stop-loss distance in percent below entry, applied under either exit
    /// rule. 0 disables the stop.
    pub exit_loss_threshold: f64,
    pub rsi_period: usize,
    pub starting_cash: f64,
    pub price_drop_days: usize,
    /// Bars a position must be held before an exit is considered.
    pub min_hold_bars: usize,
    pub sma_short_period: usize,
    pub sma_long_period: usize,
    pub volume_window: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        let indicators = IndicatorSettings::default();
        StrategyConfig {
            name: "custom".to_string(),
            entry_rule: EntryRule::PriceDropPct,
            entry_threshold: -3.0,
            exit_rule: ExitRule::GainLossPct,
            exit_gain_threshold: 2.0,
            exit_loss_threshold: 0.0,
            rsi_period: indicators.rsi_period,
            starting_cash: 10_000.0,
            price_drop_days: 3,
            min_hold_bars: 2,
            sma_short_period: indicators.sma_short_period,
            sma_long_period: indicators.sma_long_period,
            volume_window: indicators.volume_window,
        }
    }
}

impl StrategyConfig {
    pub fn indicator_settings(&self) -> IndicatorSettings {
        IndicatorSettings {
            sma_short_period: self.sma_short_period,
            sma_long_period: self.sma_long_period,
            rsi_period: self.rsi_period,
            volume_window: self.volume_window,
        }
    }

    /// Reject configurations a run cannot meaningfully use.
    pub fn validate(&self) -> Result<(), StocksimError> {
        if !(self.starting_cash.is_finite() && self.starting_cash > 0.0) {
            return Err(StocksimError::invalid(
                "starting_cash",
                "starting_cash must be positive",
            ));
        }
        if self.rsi_period == 0 {
            return Err(StocksimError::invalid(
                "rsi_period",
                "rsi_period must be at least 1",
            ));
        }

        match self.entry_rule {
            EntryRule::RsiOversold => check_rsi_level("entry_threshold", self.entry_threshold)?,
            EntryRule::PriceDropPct => {
                if !(self.entry_threshold.is_finite() && self.entry_threshold < 0.0) {
                    return Err(StocksimError::invalid(
                        "entry_threshold",
                        "price drop threshold must be a negative percent",
                    ));
                }
                if self.price_drop_days < 2 {
                    return Err(StocksimError::invalid(
                        "price_drop_days",
                        "price_drop_days must be at least 2",
                    ));
                }
            }
        }

        match self.exit_rule {
            ExitRule::RsiOverbought => {
                check_rsi_level("exit_gain_threshold", self.exit_gain_threshold)?
            }
            ExitRule::GainLossPct => {
                if !(self.exit_gain_threshold.is_finite() && self.exit_gain_threshold > 0.0) {
                    return Err(StocksimError::invalid(
                        "exit_gain_threshold",
                        "gain target must be a positive percent",
                    ));
                }
            }
        }

        if !(self.exit_loss_threshold.is_finite() && self.exit_loss_threshold >= 0.0) {
            return Err(StocksimError::invalid(
                "exit_loss_threshold",
                "stop-loss distance must be non-negative",
            ));
        }

        if self.sma_short_period == 0 || self.sma_short_period >= self.sma_long_period {
            return Err(StocksimError::invalid(
                "sma_short_period",
                "sma_short_period must be positive and below sma_long_period",
            ));
        }
        if self.volume_window == 0 {
            return Err(StocksimError::invalid(
                "volume_window",
                "volume_window must be at least 1",
            ));
        }

        Ok(())
    }
}

fn check_rsi_level(key: &str, value: f64) -> Result<(), StocksimError> {
    if value > 0.0 && value < 100.0 {
        Ok(())
    } else {
        Err(StocksimError::invalid(
            key,
            "RSI threshold must be between 0 and 100",
        ))
    }
}

pub mod presets {
    //! Named strategy configurations.

    use super::*;

    pub const NAMES: [&str; 4] = ["rsi_reversion", "dip_buyer", "deep_dip", "rsi_swing"];

    /// Buy oversold RSI(14) < 30, sell overbought RSI > 70, 10% stop.
    pub fn rsi_reversion() -> StrategyConfig {
        StrategyConfig {
            name: "rsi_reversion".into(),
            entry_rule: EntryRule::RsiOversold,
            entry_threshold: 30.0,
            exit_rule: ExitRule::RsiOverbought,
            exit_gain_threshold: 70.0,
            exit_loss_threshold: 10.0,
            ..StrategyConfig::default()
        }
    }

    /// Buy a 3-day drop of 3% or more, take +2%, stop at -5%.
    pub fn dip_buyer() -> StrategyConfig {
        StrategyConfig {
            name: "dip_buyer".into(),
            entry_rule: EntryRule::PriceDropPct,
            entry_threshold: -3.0,
            exit_rule: ExitRule::GainLossPct,
            exit_gain_threshold: 2.0,
            exit_loss_threshold: 5.0,
            ..StrategyConfig::default()
        }
    }

    /// Buy a 3-day drop of 5% or more, take +5%, stop at -8%.
    pub fn deep_dip() -> StrategyConfig {
        StrategyConfig {
            name: "deep_dip".into(),
            entry_rule: EntryRule::PriceDropPct,
            entry_threshold: -5.0,
            exit_rule: ExitRule::GainLossPct,
            exit_gain_threshold: 5.0,
            exit_loss_threshold: 8.0,
            ..StrategyConfig::default()
        }
    }

    /// Buy RSI < 35, take +4%, stop at -3%.
    pub fn rsi_swing() -> StrategyConfig {
        StrategyConfig {
            name: "rsi_swing".into(),
            entry_rule: EntryRule::RsiOversold,
            entry_threshold: 35.0,
            exit_rule: ExitRule::GainLossPct,
            exit_gain_threshold: 4.0,
            exit_loss_threshold: 3.0,
            ..StrategyConfig::default()
        }
    }

    pub fn by_name(name: &str) -> Result<StrategyConfig, StocksimError> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "rsi_reversion" => Ok(rsi_reversion()),
            "dip_buyer" => Ok(dip_buyer()),
            "deep_dip" => Ok(deep_dip()),
            "rsi_swing" => Ok(rsi_swing()),
            other => Err(StocksimError::invalid(
                "preset",
                format!("unknown preset '{other}' (known: {})", NAMES.join(", ")),
            )),
        }
    }

    pub fn all() -> Vec<StrategyConfig> {
        vec![rsi_reversion(), dip_buyer(), deep_dip(), rsi_swing()]
    }
}
