//! Report generation port trait.

use crate::domain::backtest::BacktestReport;
use crate::domain::error::StocksimError;
use std::path::Path;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), StocksimError>;

    /// Default implementation: with `per_ticker` set, one file per report
    /// suffixed with the ticker; otherwise each report goes to `output_path`.
    fn write_all(
        &self,
        reports: &[BacktestReport],
        output_path: &Path,
        per_ticker: bool,
    ) -> Result<(), StocksimError> {
        if !per_ticker {
            for report in reports {
                self.write(report, output_path)?;
            }
            return Ok(());
        }
        for report in reports {
            self.write(report, &suffixed_path(output_path, &report.ticker))?;
        }
        Ok(())
    }
}

/// `trades.csv` + `AAPL` -> `trades_AAPL.csv`.
pub fn suffixed_path(path: &Path, suffix: &str) -> std::path::PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    };
    path.with_file_name(name)
}
