//! Performance statistics for a finished run.

use serde::{Deserialize, Serialize};

use super::ohlcv::Bar;
use super::portfolio::EquityPoint;
use super::position::Trade;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    /// Round trips closed by a SELL.
    pub completed: usize,
    pub won: usize,
    pub lost: usize,
    pub breakeven: usize,
    pub win_rate_pct: f64,
    pub total_profit: f64,
    pub avg_profit_pct: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl TradeStats {
    pub fn from_trades(trades: &[Trade]) -> Self {
        let mut stats = TradeStats::default();
        let mut total_profit_pct = 0.0_f64;

        for realized in trades.iter().filter_map(|t| t.realized) {
            stats.completed += 1;
            stats.total_profit += realized.profit;
            total_profit_pct += realized.profit_pct;

            if realized.profit > 0.0 {
                stats.won += 1;
                stats.largest_win = stats.largest_win.max(realized.profit);
            } else if realized.profit < 0.0 {
                stats.lost += 1;
                stats.largest_loss = stats.largest_loss.max(realized.profit.abs());
            } else {
                stats.breakeven += 1;
            }
        }

        if stats.completed > 0 {
            stats.win_rate_pct = stats.won as f64 / stats.completed as f64 * 100.0;
            stats.avg_profit_pct = total_profit_pct / stats.completed as f64;
        }

        stats
    }
}

/// Percent change from `from` to `to`; 0 when `from` is not positive.
pub fn pct_change(from: f64, to: f64) -> f64 {
    if from > 0.0 {
        (to - from) / from * 100.0
    } else {
        0.0
    }
}

/// Return of holding from the first close to the last close.
pub fn buy_and_hold_return_pct(bars: &[Bar]) -> f64 {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => pct_change(first.close, last.close),
        _ => 0.0,
    }
}

/// Maximum peak-to-trough drawdown as a fraction, and the longest run of bars
/// spent below a prior peak.
pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}
