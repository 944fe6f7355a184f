//! CSV trade-log report adapter implementing ReportPort.
//!
//! One row per trade, in execution order. Profit columns are blank for BUY
//! rows.

use std::path::Path;

use serde::Serialize;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::StocksimError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    ticker: &'a str,
    strategy: &'a str,
    action: String,
    date: String,
    price: f64,
    shares: u64,
    profit: Option<f64>,
    profit_pct: Option<f64>,
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn report_error(path: &Path, e: impl std::fmt::Display) -> StocksimError {
        StocksimError::Report {
            reason: format!("failed to write {}: {}", path.display(), e),
        }
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), StocksimError> {
        let mut wtr =
            csv::Writer::from_path(output_path).map_err(|e| Self::report_error(output_path, e))?;

        for trade in &report.trades {
            wtr.serialize(TradeRow {
                ticker: &report.ticker,
                strategy: &report.strategy,
                action: trade.kind.to_string(),
                date: trade.date.format("%Y-%m-%d").to_string(),
                price: trade.price,
                shares: trade.shares,
                profit: trade.realized.map(|r| r.profit),
                profit_pct: trade.realized.map(|r| r.profit_pct),
            })
            .map_err(|e| Self::report_error(output_path, e))?;
        }

        if report.trades.is_empty() {
            wtr.write_record([
                "ticker",
                "strategy",
                "action",
                "date",
                "price",
                "shares",
                "profit",
                "profit_pct",
            ])
            .map_err(|e| Self::report_error(output_path, e))?;
        }

        wtr.flush().map_err(|e| Self::report_error(output_path, e))?;
        Ok(())
    }
}
