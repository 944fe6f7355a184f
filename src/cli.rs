//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestReport, BacktestWindow};
use crate::domain::config_validation::{
    parse_count, parse_date, parse_number, provider_name, validate_advisor_config,
    validate_backtest_config, validate_data_config, validate_strategy_config,
};
use crate::domain::error::StocksimError;
use crate::domain::scoring::{Advisor, AdvisorSettings, Recommendation};
use crate::domain::service::AnalysisService;
use crate::domain::strategy::{presets, EntryRule, ExitRule, StrategyConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stocksim", about = "Single-stock strategy backtester and advisor")]
pub struct Cli {
    /// Log filter used when STOCKSIM_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a strategy over each ticker's history
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long = "ticker")]
        tickers: Vec<String>,
        #[arg(short, long)]
        preset: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score each ticker and print a BUY/HOLD/SELL recommendation
    Advise {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long = "ticker")]
        tickers: Vec<String>,
    },
    /// Validate a configuration file without fetching data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the built-in strategy presets
    Presets,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            tickers,
            preset,
            output,
        } => run_backtest(&config, &tickers, preset.as_deref(), output.as_deref()),
        Command::Advise { config, tickers } => run_advise(&config, &tickers),
        Command::Validate { config } => run_validate(&config),
        Command::Presets => run_presets(),
    }
}

/// Install the global subscriber. `STOCKSIM_LOG` takes precedence over
/// `default_filter`; output goes to stderr.
pub fn init_tracing(default_filter: &str) -> Result<(), String> {
    let filter = std::env::var("STOCKSIM_LOG").unwrap_or_else(|_| default_filter.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| format!("failed to install subscriber: {err}"))
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: &StocksimError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Results of running one operation per ticker. Failures do not stop the
/// remaining tickers.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub results: Vec<T>,
    pub failures: Vec<(String, StocksimError)>,
}

impl<T> BatchOutcome<T> {
    fn collect(
        tickers: &[String],
        mut op: impl FnMut(&str) -> Result<T, StocksimError>,
    ) -> Self {
        let mut results = Vec::with_capacity(tickers.len());
        let mut failures = Vec::new();
        for ticker in tickers {
            match op(ticker) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "skipping ticker");
                    eprintln!("warning: skipping {} ({})", ticker, e);
                    failures.push((ticker.clone(), e));
                }
            }
        }
        BatchOutcome { results, failures }
    }

    /// Exit status of the first failure, 0 when every ticker ran.
    pub fn exit_status(&self) -> u8 {
        self.failures
            .first()
            .map(|(_, e)| e.exit_status())
            .unwrap_or(0)
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

fn run_backtest(
    config_path: &Path,
    ticker_overrides: &[String],
    preset_override: Option<&str>,
    output_override: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_data_config(&adapter)
        .and_then(|_| validate_backtest_config(&adapter))
        .and_then(|_| validate_strategy_config(&adapter))
    {
        return fail(&e);
    }

    let strategy = match build_strategy_config(&adapter, preset_override) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    eprintln!("Loading strategy: {}", strategy.name);

    let window = match build_window(&adapter) {
        Ok(w) => w,
        Err(e) => return fail(&e),
    };

    let tickers = resolve_tickers(ticker_overrides, &adapter);
    if tickers.is_empty() {
        return fail(&missing_tickers());
    }

    let provider = match build_provider(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    eprintln!(
        "Running backtest: {} tickers, {} to {}",
        tickers.len(),
        window.start_date,
        window.end_date
    );
    let outcome = run_backtests(provider.as_ref(), &tickers, &window, &strategy);
    for report in &outcome.results {
        print_backtest_summary(report);
    }

    let output = output_override
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("report", "output").map(PathBuf::from));
    if let Some(output) = output {
        if !outcome.results.is_empty() {
            let per_ticker = tickers.len() > 1;
            if let Err(e) =
                CsvReportAdapter::new().write_all(&outcome.results, &output, per_ticker)
            {
                return fail(&e);
            }
            eprintln!("\nTrade log written to: {}", output.display());
        }
    }

    outcome.exit_code()
}

pub fn run_backtests(
    provider: &dyn MarketDataPort,
    tickers: &[String],
    window: &BacktestWindow,
    strategy: &StrategyConfig,
) -> BatchOutcome<BacktestReport> {
    let service = AnalysisService::new(provider);
    BatchOutcome::collect(tickers, |ticker| service.backtest(ticker, window, strategy))
}

pub fn run_advice(
    provider: &dyn MarketDataPort,
    tickers: &[String],
    window: &BacktestWindow,
    advisor: &Advisor,
) -> BatchOutcome<Recommendation> {
    let service = AnalysisService::new(provider);
    BatchOutcome::collect(tickers, |ticker| service.advise(ticker, window, advisor))
}

fn print_backtest_summary(report: &BacktestReport) {
    eprintln!("\n=== {} ({}) ===", report.ticker, report.strategy);
    if let (Some(start), Some(end)) = (report.start_date, report.end_date) {
        eprintln!("Period:           {} to {} ({} bars)", start, end, report.bar_count);
    }
    eprintln!("Starting Cash:    ${:.2}", report.starting_cash);
    eprintln!("Ending Value:     ${:.2}", report.ending_value);
    eprintln!("Total Return:     {:.2}%", report.total_return_pct);
    eprintln!("Buy and Hold:     {:.2}%", report.buy_and_hold_return_pct);
    eprintln!("Max Drawdown:     -{:.1}%", report.max_drawdown_pct);
    eprintln!("Completed Trades: {}", report.completed_trade_count);
    eprintln!("Win Rate:         {:.1}%", report.win_rate_pct);
    if let Some(position) = &report.open_position {
        eprintln!(
            "Open Position:    {} shares @ ${:.2}",
            position.shares, position.entry_price
        );
    }

    for trade in &report.trades {
        match trade.realized {
            Some(realized) => {
                let sign = if realized.profit >= 0.0 { "+" } else { "" };
                eprintln!(
                    "  {}  {:<4} {:>6} @ ${:.2}  {}${:.2} ({}{:.2}%)",
                    trade.date,
                    trade.kind,
                    trade.shares,
                    trade.price,
                    sign,
                    realized.profit,
                    sign,
                    realized.profit_pct
                );
            }
            None => eprintln!(
                "  {}  {:<4} {:>6} @ ${:.2}",
                trade.date, trade.kind, trade.shares, trade.price
            ),
        }
    }
}

fn run_advise(config_path: &Path, ticker_overrides: &[String]) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_data_config(&adapter)
        .and_then(|_| validate_backtest_config(&adapter))
        .and_then(|_| validate_strategy_config(&adapter))
        .and_then(|_| validate_advisor_config(&adapter))
    {
        return fail(&e);
    }

    let built = build_window(&adapter).and_then(|w| {
        let settings = build_advisor_settings(&adapter)?;
        let strategy = build_strategy_config(&adapter, None)?;
        Ok((w, settings, strategy.indicator_settings()))
    });
    let (window, settings, indicators) = match built {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };

    let tickers = resolve_tickers(ticker_overrides, &adapter);
    if tickers.is_empty() {
        return fail(&missing_tickers());
    }

    let provider = match build_provider(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let advisor = Advisor::new(settings).with_indicators(indicators);
    let outcome = run_advice(provider.as_ref(), &tickers, &window, &advisor);
    for rec in &outcome.results {
        println!(
            "{:<8} {:<4}  score {:>5.1}  confidence {:>5.1}  (fundamental {:.0}, technical {:.0})",
            rec.ticker,
            rec.action,
            rec.overall_score,
            rec.confidence,
            rec.fundamental_score,
            rec.technical_score
        );
        for reason in &rec.reasons {
            println!("           - {}", reason);
        }
    }

    outcome.exit_code()
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checked = validate_data_config(&adapter)
        .and_then(|_| validate_backtest_config(&adapter))
        .and_then(|_| validate_strategy_config(&adapter))
        .and_then(|_| validate_advisor_config(&adapter))
        .and_then(|_| build_strategy_config(&adapter, None))
        .and_then(|strategy| build_advisor_settings(&adapter).map(|s| (strategy, s)));
    let (strategy, advisor) = match checked {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };

    let tickers = resolve_tickers(&[], &adapter);
    if tickers.is_empty() {
        return fail(&missing_tickers());
    }

    eprintln!("\nProvider:         {}", provider_name(&adapter));
    eprintln!("Tickers:          {}", tickers.join(", "));
    print_strategy(&strategy);
    eprintln!(
        "Advisor:          weights {:.2}/{:.2}, buy >= {:.0}, sell <= {:.0}",
        advisor.fundamental_weight, advisor.technical_weight, advisor.buy_at, advisor.sell_at
    );

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_presets() -> ExitCode {
    for strategy in presets::all() {
        print_strategy(&strategy);
        eprintln!();
    }
    ExitCode::SUCCESS
}

fn print_strategy(strategy: &StrategyConfig) {
    eprintln!("Strategy:         {}", strategy.name);
    eprintln!(
        "  Entry:          {} {}",
        strategy.entry_rule, strategy.entry_threshold
    );
    eprintln!(
        "  Exit:           {} {}",
        strategy.exit_rule, strategy.exit_gain_threshold
    );
    if strategy.exit_loss_threshold > 0.0 {
        eprintln!("  Stop Loss:      {}%", strategy.exit_loss_threshold);
    }
    eprintln!(
        "  RSI Period:     {}  Drop Days: {}  Min Hold: {}",
        strategy.rsi_period, strategy.price_drop_days, strategy.min_hold_bars
    );
}

/// Start from the named preset (the override, else `[strategy] preset`, else
/// defaults), then apply every `[strategy]` key that is set.
pub fn build_strategy_config(
    adapter: &dyn ConfigPort,
    preset_override: Option<&str>,
) -> Result<StrategyConfig, StocksimError> {
    let preset = preset_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("strategy", "preset"))
        .filter(|p| !p.trim().is_empty());
    let mut config = match preset {
        Some(name) => presets::by_name(&name)?,
        None => StrategyConfig::default(),
    };

    if let Some(name) = adapter
        .get_string("strategy", "name")
        .filter(|n| !n.trim().is_empty())
    {
        config.name = name.trim().to_string();
    }
    if let Some(rule) = adapter.get_string("strategy", "entry_rule") {
        config.entry_rule = rule.parse::<EntryRule>()?;
    }
    if let Some(rule) = adapter.get_string("strategy", "exit_rule") {
        config.exit_rule = rule.parse::<ExitRule>()?;
    }

    let number = |key: &str, field: &mut f64| -> Result<(), StocksimError> {
        if let Some(v) = parse_number(adapter, "strategy", key)? {
            *field = v;
        }
        Ok(())
    };
    number("entry_threshold", &mut config.entry_threshold)?;
    number("exit_gain_threshold", &mut config.exit_gain_threshold)?;
    number("exit_loss_threshold", &mut config.exit_loss_threshold)?;
    number("starting_cash", &mut config.starting_cash)?;

    let count = |key: &str, field: &mut usize| -> Result<(), StocksimError> {
        if let Some(v) = parse_count(adapter, "strategy", key)? {
            *field = v;
        }
        Ok(())
    };
    count("rsi_period", &mut config.rsi_period)?;
    count("price_drop_days", &mut config.price_drop_days)?;
    count("min_hold_bars", &mut config.min_hold_bars)?;
    count("sma_short_period", &mut config.sma_short_period)?;
    count("sma_long_period", &mut config.sma_long_period)?;
    count("volume_window", &mut config.volume_window)?;

    config.validate()?;
    Ok(config)
}

pub fn build_window(adapter: &dyn ConfigPort) -> Result<BacktestWindow, StocksimError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;
    if start_date > end_date {
        return Err(StocksimError::invalid(
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(BacktestWindow {
        start_date,
        end_date,
    })
}

pub fn build_advisor_settings(adapter: &dyn ConfigPort) -> Result<AdvisorSettings, StocksimError> {
    let defaults = AdvisorSettings::default();
    let value = |key: &str, default: f64| -> Result<f64, StocksimError> {
        Ok(parse_number(adapter, "advisor", key)?.unwrap_or(default))
    };
    let settings = AdvisorSettings {
        fundamental_weight: value("fundamental_weight", defaults.fundamental_weight)?,
        technical_weight: value("technical_weight", defaults.technical_weight)?,
        buy_at: value("buy_at", defaults.buy_at)?,
        sell_at: value("sell_at", defaults.sell_at)?,
    };
    settings.validate()?;
    Ok(settings)
}

pub fn build_provider(adapter: &dyn ConfigPort) -> Result<Box<dyn MarketDataPort>, StocksimError> {
    match provider_name(adapter).as_str() {
        "csv" => {
            let dir = adapter
                .get_string("data", "csv_dir")
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| StocksimError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir.trim()))))
        }
        #[cfg(feature = "yahoo")]
        "yahoo" => Ok(Box::new(
            crate::adapters::yahoo_adapter::YahooAdapter::new()?,
        )),
        #[cfg(not(feature = "yahoo"))]
        "yahoo" => Err(StocksimError::invalid(
            "provider",
            "yahoo provider requires the `yahoo` feature",
        )),
        other => Err(StocksimError::invalid(
            "provider",
            format!("unknown provider '{other}'"),
        )),
    }
}

fn missing_tickers() -> StocksimError {
    StocksimError::ConfigMissing {
        section: "backtest".into(),
        key: "tickers".into(),
    }
}

/// Command-line tickers when given, else `[backtest] tickers`. Uppercased and
/// deduplicated in first-seen order.
pub fn resolve_tickers(overrides: &[String], config: &dyn ConfigPort) -> Vec<String> {
    let raw: Vec<String> = if overrides.is_empty() {
        config
            .get_string("backtest", "tickers")
            .map(|s| s.split(',').map(str::to_string).collect())
            .unwrap_or_default()
    } else {
        overrides
            .iter()
            .flat_map(|s| s.split(','))
            .map(str::to_string)
            .collect()
    };

    let mut tickers: Vec<String> = Vec::with_capacity(raw.len());
    for ticker in raw.iter().map(|s| s.trim().to_uppercase()) {
        if !ticker.is_empty() && !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }
    tickers
}
