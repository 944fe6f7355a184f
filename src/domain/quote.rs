//! Point-in-time quote snapshot for a ticker.

use serde::{Deserialize, Serialize};

/// Latest quote as reported by a market data provider.
///
/// Fundamentals a provider does not expose are left as `None` rather than
/// filled with placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: Option<f64>,
    pub pe: Option<f64>,
    pub beta: Option<f64>,
    pub week52_high: f64,
    pub week52_low: f64,
}

impl Quote {
    /// Percent distance of the price above the 52-week low.
    pub fn pct_above_52w_low(&self) -> Option<f64> {
        (self.week52_low > 0.0).then(|| (self.price - self.week52_low) / self.week52_low * 100.0)
    }

    /// Percent distance of the price below the 52-week high.
    pub fn pct_below_52w_high(&self) -> Option<f64> {
        (self.week52_high > 0.0)
            .then(|| (self.week52_high - self.price) / self.week52_high * 100.0)
    }
}
