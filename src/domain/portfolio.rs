//! Cash, the single position, the trade log and the equity curve of one run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::{Position, Trade};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Position,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: Position::flat(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Buy as many whole shares as cash allows. Returns the BUY trade, or `None`
    /// when already long or the price is not affordable.
    pub fn open_long(&mut self, date: NaiveDate, index: usize, price: f64) -> Option<&Trade> {
        if !self.position.is_flat() || price <= 0.0 || self.cash < price {
            return None;
        }

        let shares = (self.cash / price).floor() as u64;
        if shares == 0 {
            return None;
        }

        self.cash -= shares as f64 * price;
        self.position = Position::long(shares, price, date, index);
        self.trades.push(Trade::buy(date, price, shares));
        self.trades.last()
    }

    /// Sell the whole position. Returns the SELL trade, or `None` when flat.
    pub fn close_long(&mut self, date: NaiveDate, price: f64) -> Option<&Trade> {
        if !self.position.is_long() {
            return None;
        }

        let position = std::mem::take(&mut self.position);
        self.cash += position.shares as f64 * price;
        self.trades
            .push(Trade::sell(date, price, position.shares, position.entry_price));
        self.trades.last()
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    pub fn total_equity(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }
}
