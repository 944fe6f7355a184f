//! CSV file market data adapter.
//!
//! History lives in `{base}/{TICKER}.csv` with the header
//! `date,open,high,low,close,volume`. Quotes come from an optional
//! `{base}/quotes.csv`; a ticker missing from it gets a quote derived from the
//! tail of its own history with no fundamentals.

use crate::domain::error::StocksimError;
use crate::domain::ohlcv::Bar;
use crate::domain::quote::Quote;
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub const QUOTES_FILE: &str = "quotes.csv";

/// Trading days in the 52-week range of a derived quote.
const YEAR_BARS: usize = 252;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }

    fn read_bars(&self, ticker: &str) -> Result<Vec<Bar>, StocksimError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| {
            StocksimError::provider(ticker, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<Bar>().enumerate() {
            let bar = result.map_err(|e| {
                StocksimError::provider(
                    ticker,
                    format!("CSV parse error in {} row {}: {}", path.display(), line + 1, e),
                )
            })?;
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(StocksimError::provider(
                ticker,
                format!("duplicate date {} in {}", pair[0].date, path.display()),
            ));
        }
        Ok(bars)
    }

    fn read_listed_quote(&self, ticker: &str) -> Result<Option<Quote>, StocksimError> {
        let path = self.base_path.join(QUOTES_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| {
                StocksimError::provider(ticker, format!("failed to read {}: {}", path.display(), e))
            })?;

        for result in rdr.deserialize::<Quote>() {
            let quote = result.map_err(|e| {
                StocksimError::provider(
                    ticker,
                    format!("CSV parse error in {}: {}", path.display(), e),
                )
            })?;
            if quote.ticker.eq_ignore_ascii_case(ticker) {
                return Ok(Some(quote));
            }
        }
        Ok(None)
    }
}

/// Quote from the most recent bars. Fundamentals are left unset.
fn quote_from_history(ticker: &str, bars: &[Bar]) -> Option<Quote> {
    let last = bars.last()?;
    let prev_close = bars
        .len()
        .checked_sub(2)
        .map(|i| bars[i].close)
        .unwrap_or(last.close);
    let year = &bars[bars.len().saturating_sub(YEAR_BARS)..];
    let week52_high = year.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let week52_low = year.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let change = last.close - prev_close;

    Some(Quote {
        ticker: ticker.to_uppercase(),
        name: ticker.to_uppercase(),
        price: last.close,
        change,
        change_percent: if prev_close > 0.0 {
            change / prev_close * 100.0
        } else {
            0.0
        },
        volume: last.volume,
        market_cap: None,
        pe: None,
        beta: None,
        week52_high,
        week52_low,
    })
}

impl MarketDataPort for CsvAdapter {
    fn get_quote(&self, ticker: &str) -> Result<Quote, StocksimError> {
        if let Some(quote) = self.read_listed_quote(ticker)? {
            return Ok(quote);
        }
        let bars = self.read_bars(ticker)?;
        quote_from_history(ticker, &bars)
            .ok_or_else(|| StocksimError::provider(ticker, "history file has no rows"))
    }

    fn get_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, StocksimError> {
        let mut bars = self.read_bars(ticker)?;
        bars.retain(|b| b.date >= start && b.date <= end);
        Ok(bars)
    }
}
