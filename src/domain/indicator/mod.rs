//! Indicator engine.
//!
//! Pure functions over an ordered sequence of closing prices (and volumes):
//! - `sma`: simple moving average of the last n prices
//! - `rsi`: Wilder-smoothed Relative Strength Index, plus `RsiState` for rolling use
//! - `trend`: coarse trend label from two adjacent 10-bar means
//! - `roc`: percent change over a lookback
//! - `volume_ratio`: latest volume against its recent average
//!
//! None of these fail on short input. Each returns a sentinel (`None`, `Trend::Neutral`
//! or a neutral ratio) until its warm-up window is filled.

pub mod roc;
pub mod rsi;
pub mod sma;
pub mod trend;
pub mod volume;

use serde::{Deserialize, Serialize};

use crate::domain::ohlcv::{self, Bar};

pub use roc::roc;
pub use rsi::{rsi, RsiState, NEUTRAL_RSI};
pub use sma::sma;
pub use trend::{trend, Trend};
pub use volume::volume_ratio;

/// Lookback windows used when building an [`IndicatorSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSettings {
    pub sma_short_period: usize,
    pub sma_long_period: usize,
    pub rsi_period: usize,
    pub volume_window: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        IndicatorSettings {
            sma_short_period: 20,
            sma_long_period: 50,
            rsi_period: 14,
            volume_window: 20,
        }
    }
}

/// Indicator values for one evaluation day, derived from the bars up to and
/// including that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub trend: Trend,
    pub volume_ratio: f64,
}

impl IndicatorSnapshot {
    /// Compute every indicator over `bars`, RSI included.
    pub fn compute(bars: &[Bar], settings: &IndicatorSettings) -> Self {
        let closes = ohlcv::closes(bars);
        let rsi = rsi(&closes, settings.rsi_period);
        Self::with_rsi(&closes, &ohlcv::volumes(bars), settings, rsi)
    }

    /// Build a snapshot with an RSI value that was computed elsewhere, e.g. by
    /// an [`RsiState`] fed the same closes.
    pub fn with_rsi(
        closes: &[f64],
        volumes: &[f64],
        settings: &IndicatorSettings,
        rsi: Option<f64>,
    ) -> Self {
        IndicatorSnapshot {
            sma_short: sma(closes, settings.sma_short_period),
            sma_long: sma(closes, settings.sma_long_period),
            rsi,
            trend: trend(closes),
            volume_ratio: volume_ratio(volumes, settings.volume_window),
        }
    }

    /// RSI with the neutral default substituted during warm-up.
    pub fn rsi_or_neutral(&self) -> f64 {
        self.rsi.unwrap_or(NEUTRAL_RSI)
    }
}
