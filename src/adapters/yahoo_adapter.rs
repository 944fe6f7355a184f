//! Yahoo Finance market data adapter.
//!
//! Reads daily bars and a quote from the v8 chart API. Requests time out after
//! 30 seconds; 429 and 5xx responses are retried a bounded number of times with
//! exponential backoff. Every other failure is reported as
//! `ProviderUnavailable` for the ticker.

use crate::domain::error::StocksimError;
use crate::domain::ohlcv::Bar;
use crate::domain::quote::Quote;
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_volume: Option<u64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooAdapter {
    pub fn new() -> Result<Self, StocksimError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| {
                StocksimError::provider("yahoo", format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn history_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!("{BASE_URL}/{ticker}?period1={start_ts}&period2={end_ts}&interval=1d")
    }

    fn quote_url(ticker: &str) -> String {
        format!("{BASE_URL}/{ticker}?range=5d&interval=1d")
    }

    fn fetch_chart(&self, ticker: &str, url: &str) -> Result<ChartData, StocksimError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(ticker, attempt, ?delay, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                        || status.is_server_error()
                    {
                        warn!(ticker, %status, "Yahoo request failed, will retry");
                        last_error = Some(format!("HTTP {status}"));
                        continue;
                    }

                    if !status.is_success() {
                        return Err(StocksimError::provider(ticker, format!("HTTP {status}")));
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        StocksimError::provider(ticker, format!("failed to parse response: {e}"))
                    })?;
                    return parse_chart(ticker, chart);
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(e.to_string());
                }
                Err(e) => return Err(StocksimError::provider(ticker, e.to_string())),
            }
        }

        Err(StocksimError::provider(
            ticker,
            last_error.unwrap_or_else(|| "max retries exceeded".into()),
        ))
    }
}

fn parse_chart(ticker: &str, resp: ChartResponse) -> Result<ChartData, StocksimError> {
    let results = match (resp.chart.result, resp.chart.error) {
        (_, Some(err)) => {
            return Err(StocksimError::provider(
                ticker,
                format!("{}: {}", err.code, err.description),
            ));
        }
        (Some(results), None) => results,
        (None, None) => {
            return Err(StocksimError::provider(ticker, "empty result with no error"));
        }
    };

    results
        .into_iter()
        .next()
        .ok_or_else(|| StocksimError::provider(ticker, "result array is empty"))
}

/// Ascending bars within `[start, end]`. Rows with a missing price are skipped.
fn bars_from_chart(
    ticker: &str,
    data: &ChartData,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Bar>, StocksimError> {
    let Some(timestamps) = data.timestamp.as_ref() else {
        return Ok(Vec::new());
    };
    let quote = data
        .indicators
        .quote
        .first()
        .ok_or_else(|| StocksimError::provider(ticker, "no quote data"))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| StocksimError::provider(ticker, format!("invalid timestamp: {ts}")))?;
        if date < start || date > end {
            continue;
        }

        let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            continue;
        };

        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    Ok(bars)
}

/// Quote from the chart metadata. The chart API carries no valuation data, so
/// market cap, P/E and beta stay unset.
fn quote_from_chart(ticker: &str, data: &ChartData) -> Result<Quote, StocksimError> {
    let meta = &data.meta;
    let price = meta
        .regular_market_price
        .ok_or_else(|| StocksimError::provider(ticker, "no regular market price"))?;
    let prev_close = meta.chart_previous_close.unwrap_or(price);
    let change = price - prev_close;

    Ok(Quote {
        ticker: meta.symbol.clone(),
        name: meta
            .long_name
            .clone()
            .or_else(|| meta.short_name.clone())
            .unwrap_or_else(|| meta.symbol.clone()),
        price,
        change,
        change_percent: if prev_close > 0.0 {
            change / prev_close * 100.0
        } else {
            0.0
        },
        volume: meta.regular_market_volume.unwrap_or(0),
        market_cap: None,
        pe: None,
        beta: None,
        week52_high: meta.fifty_two_week_high.unwrap_or(0.0),
        week52_low: meta.fifty_two_week_low.unwrap_or(0.0),
    })
}

impl MarketDataPort for YahooAdapter {
    fn get_quote(&self, ticker: &str) -> Result<Quote, StocksimError> {
        let data = self.fetch_chart(ticker, &Self::quote_url(ticker))?;
        quote_from_chart(ticker, &data)
    }

    fn get_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, StocksimError> {
        let data = self.fetch_chart(ticker, &Self::history_url(ticker, start, end))?;
        bars_from_chart(ticker, &data, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_JSON: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "AAPL",
                    "longName": "Apple Inc.",
                    "regularMarketPrice": 187.5,
                    "chartPreviousClose": 185.0,
                    "regularMarketVolume": 51000000,
                    "fiftyTwoWeekHigh": 199.6,
                    "fiftyTwoWeekLow": 164.1
                },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open": [187.15, null, 182.15],
                        "high": [188.44, null, 183.09],
                        "low": [183.89, null, 180.88],
                        "close": [185.64, null, 181.91],
                        "volume": [82488700, null, 71983600]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    fn chart() -> ChartData {
        let resp: ChartResponse = serde_json::from_str(CHART_JSON).unwrap();
        parse_chart("AAPL", resp).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn parses_bars_and_skips_missing_rows() {
        let bars = bars_from_chart("AAPL", &chart(), date(1), date(31)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date(2));
        assert_eq!(bars[0].close, 185.64);
        assert_eq!(bars[0].volume, 82_488_700);
        assert_eq!(bars[1].date, date(4));
    }

    #[test]
    fn bars_are_filtered_to_window() {
        let bars = bars_from_chart("AAPL", &chart(), date(3), date(31)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(4));
    }

    #[test]
    fn quote_from_meta() {
        let quote = quote_from_chart("AAPL", &chart()).unwrap();
        assert_eq!(quote.name, "Apple Inc.");
        assert_eq!(quote.price, 187.5);
        assert!((quote.change - 2.5).abs() < 1e-9);
        assert_eq!(quote.week52_low, 164.1);
        assert_eq!(quote.pe, None);
        assert_eq!(quote.market_cap, None);
    }

    #[test]
    fn api_error_is_provider_unavailable() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let err = parse_chart("ZZZZ", resp).unwrap_err();
        assert!(
            matches!(err, StocksimError::ProviderUnavailable { ref ticker, .. } if ticker == "ZZZZ")
        );
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn missing_timestamps_yield_no_bars() {
        let json = r#"{"chart":{"result":[{"meta":{"symbol":"NEW"},"indicators":{"quote":[{"open":[],"high":[],"low":[],"close":[],"volume":[]}]}}],"error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let data = parse_chart("NEW", resp).unwrap();
        assert!(bars_from_chart("NEW", &data, date(1), date(31)).unwrap().is_empty());
        assert!(quote_from_chart("NEW", &data).is_err());
    }

    #[test]
    fn history_url_spans_whole_end_day() {
        let url = YahooAdapter::history_url("AAPL", date(2), date(4));
        assert!(url.contains("period1=1704153600"));
        assert!(url.contains("period2=1704412800"));
        assert!(url.contains("interval=1d"));
    }
}
