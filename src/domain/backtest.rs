//! Single-position backtest simulator.
//!
//! One forward pass over the bars. At bar `i` the simulator sees only bars
//! `0..=i`: it updates the rolling indicators, then either looks for an entry
//! (FLAT) or an exit (LONG) at that bar's close. The final bar marks any open
//! shares to market for reporting without recording a trade.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::indicator::{roc, IndicatorSnapshot, RsiState};
use crate::domain::metrics::{self, TradeStats};
use crate::domain::ohlcv::Bar;
use crate::domain::portfolio::{EquityPoint, Portfolio};
use crate::domain::position::{Position, PositionState, Trade};
use crate::domain::strategy::{EntryRule, ExitRule, StrategyConfig};

/// Date window requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub ticker: String,
    pub strategy: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bar_count: usize,
    pub starting_cash: f64,
    pub ending_value: f64,
    pub total_return_pct: f64,
    pub trades: Vec<Trade>,
    pub win_rate_pct: f64,
    pub completed_trade_count: usize,
    pub stats: TradeStats,
    pub open_position: Option<Position>,
    pub max_drawdown_pct: f64,
    pub max_drawdown_duration: usize,
    pub buy_and_hold_return_pct: f64,
    pub equity_curve: Vec<EquityPoint>,
}

/// Runs one strategy over one bar sequence. Construct one per run; nothing is
/// shared between simulators.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: StrategyConfig,
}

impl Simulator {
    pub fn new(config: StrategyConfig) -> Self {
        Simulator { config }
    }

    pub fn run(&self, ticker: &str, bars: &[Bar]) -> BacktestReport {
        let settings = self.config.indicator_settings();
        let mut portfolio = Portfolio::new(self.config.starting_cash);
        let mut rsi_state = RsiState::new(self.config.rsi_period);
        let mut closes = Vec::with_capacity(bars.len());
        let mut volumes = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            closes.push(bar.close);
            volumes.push(bar.volume as f64);
            let rsi = rsi_state.update(bar.close);
            let snapshot = IndicatorSnapshot::with_rsi(&closes, &volumes, &settings, rsi);

            match portfolio.position.state {
                PositionState::Flat => {
                    if self.should_enter(&closes, &snapshot) {
                        if let Some(trade) = portfolio.open_long(bar.date, i, bar.close) {
                            debug!(
                                ticker,
                                date = %trade.date,
                                price = trade.price,
                                shares = trade.shares,
                                rsi = ?snapshot.rsi,
                                "BUY"
                            );
                        }
                    }
                }
                PositionState::Long => {
                    if self.should_exit(&portfolio.position, i, bar.close, &snapshot) {
                        if let Some(trade) = portfolio.close_long(bar.date, bar.close) {
                            debug!(
                                ticker,
                                date = %trade.date,
                                price = trade.price,
                                shares = trade.shares,
                                profit = ?trade.profit(),
                                "SELL"
                            );
                        }
                    }
                }
            }

            debug_assert!(portfolio.position.is_consistent());
            let equity = portfolio.total_equity(bar.close);
            portfolio.record_equity(bar.date, equity);
        }

        self.report(ticker, bars, portfolio)
    }

    fn should_enter(&self, closes: &[f64], snapshot: &IndicatorSnapshot) -> bool {
        match self.config.entry_rule {
            EntryRule::RsiOversold => snapshot.rsi_or_neutral() < self.config.entry_threshold,
            EntryRule::PriceDropPct => {
                let lookback = self.config.price_drop_days.saturating_sub(1);
                roc(closes, lookback).is_some_and(|pct| pct <= self.config.entry_threshold)
            }
        }
    }

    fn should_exit(
        &self,
        position: &Position,
        index: usize,
        close: f64,
        snapshot: &IndicatorSnapshot,
    ) -> bool {
        if position.bars_held(index) < self.config.min_hold_bars {
            return false;
        }

        let gain_pct = position.gain_pct(close);
        if self.config.exit_loss_threshold > 0.0 && gain_pct <= -self.config.exit_loss_threshold {
            return true;
        }

        match self.config.exit_rule {
            ExitRule::RsiOverbought => snapshot.rsi_or_neutral() > self.config.exit_gain_threshold,
            ExitRule::GainLossPct => gain_pct >= self.config.exit_gain_threshold,
        }
    }

    fn report(&self, ticker: &str, bars: &[Bar], portfolio: Portfolio) -> BacktestReport {
        let starting_cash = portfolio.initial_capital;
        let ending_value = portfolio
            .equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(starting_cash);
        let stats = TradeStats::from_trades(&portfolio.trades);
        let (max_drawdown, max_drawdown_duration) =
            metrics::compute_drawdown(&portfolio.equity_curve);

        BacktestReport {
            ticker: ticker.to_string(),
            strategy: self.config.name.clone(),
            start_date: bars.first().map(|b| b.date),
            end_date: bars.last().map(|b| b.date),
            bar_count: bars.len(),
            starting_cash,
            ending_value,
            total_return_pct: metrics::pct_change(starting_cash, ending_value),
            win_rate_pct: stats.win_rate_pct,
            completed_trade_count: stats.completed,
            stats,
            open_position: portfolio.position.is_long().then(|| portfolio.position.clone()),
            max_drawdown_pct: max_drawdown * 100.0,
            max_drawdown_duration,
            buy_and_hold_return_pct: metrics::buy_and_hold_return_pct(bars),
            trades: portfolio.trades,
            equity_curve: portfolio.equity_curve,
        }
    }
}
