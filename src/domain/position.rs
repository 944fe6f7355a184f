//! Single position state and the trade log entries it produces.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionState {
    Flat,
    Long,
}

/// The one open position a simulation may hold. Long only, never pyramided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub state: PositionState,
    pub entry_price: f64,
    pub entry_date: Option<NaiveDate>,
    pub entry_index: usize,
    pub shares: u64,
}

impl Default for Position {
    fn default() -> Self {
        Self::flat()
    }
}

impl Position {
    pub fn flat() -> Self {
        Position {
            state: PositionState::Flat,
            entry_price: 0.0,
            entry_date: None,
            entry_index: 0,
            shares: 0,
        }
    }

    pub fn long(shares: u64, entry_price: f64, entry_date: NaiveDate, entry_index: usize) -> Self {
        Position {
            state: PositionState::Long,
            entry_price,
            entry_date: Some(entry_date),
            entry_index,
            shares,
        }
    }

    pub fn is_long(&self) -> bool {
        self.state == PositionState::Long
    }

    pub fn is_flat(&self) -> bool {
        self.state == PositionState::Flat
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    /// Percent move of `price` relative to the entry price.
    pub fn gain_pct(&self, price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (price - self.entry_price) / self.entry_price * 100.0
    }

    /// Bars elapsed since entry when evaluating bar `index`.
    pub fn bars_held(&self, index: usize) -> usize {
        index.saturating_sub(self.entry_index)
    }

    /// FLAT holds nothing; LONG holds at least one share.
    pub fn is_consistent(&self) -> bool {
        match self.state {
            PositionState::Flat => self.shares == 0,
            PositionState::Long => self.shares > 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => f.pad("BUY"),
            TradeKind::Sell => f.pad("SELL"),
        }
    }
}

/// Profit realized by a SELL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Realized {
    pub profit: f64,
    pub profit_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub kind: TradeKind,
    pub date: NaiveDate,
    pub price: f64,
    pub shares: u64,
    pub realized: Option<Realized>,
}

impl Trade {
    pub fn buy(date: NaiveDate, price: f64, shares: u64) -> Self {
        Trade {
            kind: TradeKind::Buy,
            date,
            price,
            shares,
            realized: None,
        }
    }

    pub fn sell(date: NaiveDate, price: f64, shares: u64, entry_price: f64) -> Self {
        let profit = (price - entry_price) * shares as f64;
        let profit_pct = if entry_price == 0.0 {
            0.0
        } else {
            (price - entry_price) / entry_price * 100.0
        };
        Trade {
            kind: TradeKind::Sell,
            date,
            price,
            shares,
            realized: Some(Realized { profit, profit_pct }),
        }
    }

    pub fn profit(&self) -> Option<f64> {
        self.realized.map(|r| r.profit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn flat_position_is_consistent() {
        let pos = Position::flat();
        assert!(pos.is_flat());
        assert!(!pos.is_long());
        assert!(pos.is_consistent());
        assert_eq!(pos, Position::default());
    }

    #[test]
    fn long_position_fields() {
        let pos = Position::long(100, 50.0, date(), 3);
        assert!(pos.is_long());
        assert!(pos.is_consistent());
        assert_eq!(pos.entry_date, Some(date()));
        assert_eq!(pos.bars_held(5), 2);
        assert_eq!(pos.bars_held(1), 0);
    }

    #[test]
    fn inconsistent_states_detected() {
        let mut pos = Position::flat();
        pos.shares = 5;
        assert!(!pos.is_consistent());
        let empty_long = Position::long(0, 10.0, date(), 0);
        assert!(!empty_long.is_consistent());
    }

    #[test]
    fn market_value_scales_with_price() {
        let pos = Position::long(100, 50.0, date(), 0);
        assert!((pos.market_value(55.0) - 5500.0).abs() < f64::EPSILON);
        assert_eq!(Position::flat().market_value(55.0), 0.0);
    }

    #[test]
    fn gain_pct_relative_to_entry() {
        let pos = Position::long(10, 94.0, date(), 0);
        assert!((pos.gain_pct(99.0) - (5.0 / 94.0 * 100.0)).abs() < 1e-12);
        assert!(pos.gain_pct(90.0) < 0.0);
        assert_eq!(Position::flat().gain_pct(10.0), 0.0);
    }

    #[test]
    fn buy_trade_has_no_realized_profit() {
        let trade = Trade::buy(date(), 94.0, 106);
        assert_eq!(trade.kind, TradeKind::Buy);
        assert!(trade.realized.is_none());
        assert_eq!(trade.profit(), None);
    }

    #[test]
    fn sell_trade_realizes_profit() {
        let trade = Trade::sell(date(), 99.0, 106, 94.0);
        assert_eq!(trade.kind, TradeKind::Sell);
        let realized = trade.realized.unwrap();
        assert!((realized.profit - 530.0).abs() < 1e-9);
        assert!((realized.profit_pct - 5.0 / 94.0 * 100.0).abs() < 1e-12);
    }

    #[test]
    fn trade_kind_display() {
        assert_eq!(TradeKind::Buy.to_string(), "BUY");
        assert_eq!(TradeKind::Sell.to_string(), "SELL");
    }
}
