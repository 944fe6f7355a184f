//! Wires a market data provider to the simulator and the advisor.

use tracing::info;

use crate::domain::backtest::{BacktestReport, BacktestWindow, Simulator};
use crate::domain::error::StocksimError;
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::ohlcv::{self, Bar};
use crate::domain::scoring::{Advisor, Recommendation, TechnicalContext};
use crate::domain::strategy::StrategyConfig;
use crate::ports::market_data_port::MarketDataPort;

/// Per-caller handle on a provider. Holds no state between calls.
pub struct AnalysisService<'a> {
    provider: &'a dyn MarketDataPort,
}

impl<'a> AnalysisService<'a> {
    pub fn new(provider: &'a dyn MarketDataPort) -> Self {
        AnalysisService { provider }
    }

    /// Validate `config`, fetch the window once and simulate over it.
    pub fn backtest(
        &self,
        ticker: &str,
        window: &BacktestWindow,
        config: &StrategyConfig,
    ) -> Result<BacktestReport, StocksimError> {
        config.validate()?;
        let bars = self.fetch_history(ticker, window)?;

        let report = Simulator::new(config.clone()).run(ticker, &bars);
        info!(
            ticker,
            strategy = %report.strategy,
            trades = report.trades.len(),
            total_return_pct = report.total_return_pct,
            "backtest complete"
        );
        Ok(report)
    }

    /// Score the latest quote and the indicators at the final bar of the window.
    pub fn advise(
        &self,
        ticker: &str,
        window: &BacktestWindow,
        advisor: &Advisor,
    ) -> Result<Recommendation, StocksimError> {
        advisor.settings().validate()?;
        let quote = self.provider.get_quote(ticker)?;
        let bars = self.fetch_history(ticker, window)?;

        let snapshot = IndicatorSnapshot::compute(&bars, advisor.indicators());
        let context = TechnicalContext {
            price: quote.price,
            snapshot,
        };
        let recommendation = advisor.recommend(&quote, &context);
        info!(
            ticker,
            action = %recommendation.action,
            score = recommendation.overall_score,
            "advice ready"
        );
        Ok(recommendation)
    }

    fn fetch_history(
        &self,
        ticker: &str,
        window: &BacktestWindow,
    ) -> Result<Vec<Bar>, StocksimError> {
        if window.start_date > window.end_date {
            return Err(StocksimError::invalid(
                "start_date",
                format!(
                    "{} is after end_date {}",
                    window.start_date, window.end_date
                ),
            ));
        }

        info!(ticker, start = %window.start_date, end = %window.end_date, "fetching history");
        let bars = self
            .provider
            .get_history(ticker, window.start_date, window.end_date)?;
        if bars.is_empty() {
            return Err(StocksimError::NoData {
                ticker: ticker.to_string(),
            });
        }
        if !ohlcv::is_ascending(&bars) {
            return Err(StocksimError::provider(
                ticker,
                "history is not one bar per day in ascending date order",
            ));
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quote::Quote;
    use crate::domain::indicator::IndicatorSettings;
    use crate::domain::scoring::Action;
    use chrono::NaiveDate;
    use std::cell::Cell;

    struct StubProvider {
        closes: Vec<f64>,
        fail: bool,
        same_day: bool,
        history_calls: Cell<usize>,
    }

    impl StubProvider {
        fn new(closes: &[f64]) -> Self {
            StubProvider {
                closes: closes.to_vec(),
                fail: false,
                same_day: false,
                history_calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            StubProvider {
                fail: true,
                ..Self::new(&[])
            }
        }
    }

    impl MarketDataPort for StubProvider {
        fn get_quote(&self, ticker: &str) -> Result<Quote, StocksimError> {
            if self.fail {
                return Err(StocksimError::provider(ticker, "offline"));
            }
            Ok(Quote {
                ticker: ticker.to_string(),
                name: ticker.to_string(),
                price: self.closes.last().copied().unwrap_or_default(),
                change: 0.0,
                change_percent: 0.0,
                volume: 1_000,
                market_cap: None,
                pe: None,
                beta: None,
                week52_high: 0.0,
                week52_low: 0.0,
            })
        }

        fn get_history(
            &self,
            ticker: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<Bar>, StocksimError> {
            self.history_calls.set(self.history_calls.get() + 1);
            if self.fail {
                return Err(StocksimError::provider(ticker, "offline"));
            }
            Ok(self
                .closes
                .iter()
                .enumerate()
                .map(|(i, &close)| Bar {
                    date: if self.same_day {
                        start
                    } else {
                        start + chrono::Duration::days(i as i64)
                    },
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1_000,
                })
                .collect())
        }
    }

    fn window() -> BacktestWindow {
        BacktestWindow {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        }
    }

    #[test]
    fn backtest_runs_worked_example() {
        let provider = StubProvider::new(&[100.0, 97.0, 94.0, 96.0, 99.0]);
        let service = AnalysisService::new(&provider);
        let report = service
            .backtest("TEST", &window(), &StrategyConfig::default())
            .unwrap();
        assert_eq!(report.trades.len(), 2);
        assert!((report.ending_value - 10_530.0).abs() < 1e-9);
        assert_eq!(provider.history_calls.get(), 1);
    }

    #[test]
    fn invalid_config_rejected_before_fetch() {
        let provider = StubProvider::new(&[100.0, 97.0]);
        let service = AnalysisService::new(&provider);
        let config = StrategyConfig {
            starting_cash: 0.0,
            ..StrategyConfig::default()
        };
        let err = service.backtest("TEST", &window(), &config).unwrap_err();
        assert!(matches!(err, StocksimError::InvalidConfiguration { .. }));
        assert_eq!(provider.history_calls.get(), 0);
    }

    #[test]
    fn inverted_window_rejected() {
        let provider = StubProvider::new(&[100.0]);
        let service = AnalysisService::new(&provider);
        let w = BacktestWindow {
            start_date: window().end_date,
            end_date: window().start_date,
        };
        let err = service
            .backtest("TEST", &w, &StrategyConfig::default())
            .unwrap_err();
        assert!(matches!(err, StocksimError::InvalidConfiguration { .. }));
    }

    #[test]
    fn empty_history_is_no_data() {
        let provider = StubProvider::new(&[]);
        let service = AnalysisService::new(&provider);
        let err = service
            .backtest("EMPTY", &window(), &StrategyConfig::default())
            .unwrap_err();
        assert!(matches!(err, StocksimError::NoData { ref ticker } if ticker == "EMPTY"));
    }

    #[test]
    fn unordered_history_is_provider_error() {
        let provider = StubProvider {
            same_day: true,
            ..StubProvider::new(&[100.0, 50.0, 60.0])
        };
        let service = AnalysisService::new(&provider);
        let err = service
            .backtest("DUP", &window(), &StrategyConfig::default())
            .unwrap_err();
        assert!(
            matches!(err, StocksimError::ProviderUnavailable { ref ticker, .. } if ticker == "DUP")
        );
    }

    #[test]
    fn provider_failure_propagates() {
        let provider = StubProvider::failing();
        let service = AnalysisService::new(&provider);
        let err = service
            .backtest("DOWN", &window(), &StrategyConfig::default())
            .unwrap_err();
        assert!(matches!(err, StocksimError::ProviderUnavailable { .. }));

        let err = service
            .advise("DOWN", &window(), &Advisor::default())
            .unwrap_err();
        assert!(matches!(err, StocksimError::ProviderUnavailable { .. }));
    }

    #[test]
    fn advise_uses_advisor_indicator_windows() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let provider = StubProvider::new(&closes);
        let service = AnalysisService::new(&provider);

        let defaults = service
            .advise("TEST", &window(), &Advisor::default())
            .unwrap();
        assert_eq!(defaults.technical_score, 50.0);

        let short_windows = Advisor::default().with_indicators(IndicatorSettings {
            sma_short_period: 3,
            sma_long_period: 5,
            ..IndicatorSettings::default()
        });
        let rec = service.advise("TEST", &window(), &short_windows).unwrap();
        // price 109 above SMA(3) 108, which is above SMA(5) 107
        assert_eq!(rec.technical_score, 65.0);
    }

    #[test]
    fn advise_on_short_history_holds() {
        let provider = StubProvider::new(&[100.0, 101.0, 100.5]);
        let service = AnalysisService::new(&provider);
        let rec = service
            .advise("TEST", &window(), &Advisor::default())
            .unwrap();
        assert_eq!(rec.action, Action::Hold);
        assert_eq!(rec.ticker, "TEST");
    }
}
