#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
pub use stocksim::domain::backtest::BacktestWindow;
use stocksim::domain::error::StocksimError;
pub use stocksim::domain::ohlcv::Bar;
pub use stocksim::domain::quote::Quote;
use stocksim::ports::market_data_port::MarketDataPort;

pub struct MockMarketData {
    pub bars: HashMap<String, Vec<Bar>>,
    pub quotes: HashMap<String, Quote>,
    pub errors: HashMap<String, String>,
    pub history_requests: RefCell<Vec<String>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            quotes: HashMap::new(),
            errors: HashMap::new(),
            history_requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_quote(mut self, quote: Quote) -> Self {
        self.quotes.insert(quote.ticker.clone(), quote);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    fn check(&self, ticker: &str) -> Result<(), StocksimError> {
        match self.errors.get(ticker) {
            Some(reason) => Err(StocksimError::provider(ticker, reason.clone())),
            None => Ok(()),
        }
    }
}

impl MarketDataPort for MockMarketData {
    fn get_quote(&self, ticker: &str) -> Result<Quote, StocksimError> {
        self.check(ticker)?;
        if let Some(quote) = self.quotes.get(ticker) {
            return Ok(quote.clone());
        }
        let last = self
            .bars
            .get(ticker)
            .and_then(|b| b.last())
            .ok_or_else(|| StocksimError::provider(ticker, "unknown ticker"))?;
        Ok(make_quote(ticker, last.close))
    }

    fn get_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, StocksimError> {
        self.history_requests.borrow_mut().push(ticker.to_string());
        self.check(ticker)?;
        Ok(self
            .bars
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> Bar {
    Bar {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000_000,
    }
}

/// One bar per calendar day from 2024-01-01.
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1_000_000 + (i as u64 % 5) * 10_000,
        })
        .collect()
}

/// Deterministic sawtooth with a 10-bar period: falls 2 per bar for five bars,
/// then climbs back.
pub fn generate_sawtooth(len: usize, base: f64) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let phase = (i % 10) as f64;
            if phase < 5.0 {
                base - phase * 2.0
            } else {
                base - (10.0 - phase) * 2.0
            }
        })
        .collect()
}

pub fn make_quote(ticker: &str, price: f64) -> Quote {
    Quote {
        ticker: ticker.to_string(),
        name: format!("{ticker} Inc"),
        price,
        change: 0.0,
        change_percent: 0.0,
        volume: 1_000_000,
        market_cap: None,
        pe: None,
        beta: None,
        week52_high: 0.0,
        week52_low: 0.0,
    }
}

pub fn full_year() -> BacktestWindow {
    BacktestWindow {
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
    }
}
