//! Coarse trend classification.
//!
//! Compares the mean of the most recent 10 prices with the mean of the 10
//! before them. pct = (recent - prior) / prior * 100
//! > 2: STRONG_UP, > 0.5: UP, < -2: STRONG_DOWN, < -0.5: DOWN, else NEUTRAL.
//! Fewer than 20 prices (or a zero prior mean) is NEUTRAL.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of prices in each of the two compared windows.
pub const TREND_WINDOW: usize = 10;

const STRONG_THRESHOLD_PCT: f64 = 2.0;
const WEAK_THRESHOLD_PCT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    StrongUp,
    Up,
    Neutral,
    Down,
    StrongDown,
}

impl Trend {
    pub fn from_pct_change(pct: f64) -> Self {
        if pct > STRONG_THRESHOLD_PCT {
            Trend::StrongUp
        } else if pct > WEAK_THRESHOLD_PCT {
            Trend::Up
        } else if pct < -STRONG_THRESHOLD_PCT {
            Trend::StrongDown
        } else if pct < -WEAK_THRESHOLD_PCT {
            Trend::Down
        } else {
            Trend::Neutral
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::StrongUp => "STRONG_UP",
            Trend::Up => "UP",
            Trend::Neutral => "NEUTRAL",
            Trend::Down => "DOWN",
            Trend::StrongDown => "STRONG_DOWN",
        };
        f.write_str(label)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn trend(prices: &[f64]) -> Trend {
    let n = prices.len();
    if n < TREND_WINDOW * 2 {
        return Trend::Neutral;
    }

    let recent = mean(&prices[n - TREND_WINDOW..]);
    let prior = mean(&prices[n - 2 * TREND_WINDOW..n - TREND_WINDOW]);
    if prior == 0.0 {
        return Trend::Neutral;
    }

    Trend::from_pct_change((recent - prior) / prior * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(first: &[f64; 10], second: &[f64; 10]) -> Vec<f64> {
        first.iter().chain(second.iter()).copied().collect()
    }

    #[test]
    fn too_short_is_neutral() {
        let prices: Vec<f64> = (0..19).map(|i| 100.0 + i as f64 * 10.0).collect();
        assert_eq!(trend(&prices), Trend::Neutral);
    }

    #[test]
    fn thresholds() {
        let flat = [100.0; 10];
        assert_eq!(trend(&series(&flat, &[103.0; 10])), Trend::StrongUp);
        assert_eq!(trend(&series(&flat, &[101.0; 10])), Trend::Up);
        assert_eq!(trend(&series(&flat, &[100.2; 10])), Trend::Neutral);
        assert_eq!(trend(&series(&flat, &[99.0; 10])), Trend::Down);
        assert_eq!(trend(&series(&flat, &[97.0; 10])), Trend::StrongDown);
    }

    #[test]
    fn boundaries_are_exclusive() {
        assert_eq!(Trend::from_pct_change(2.0), Trend::Up);
        assert_eq!(Trend::from_pct_change(0.5), Trend::Neutral);
        assert_eq!(Trend::from_pct_change(-0.5), Trend::Neutral);
        assert_eq!(Trend::from_pct_change(-2.0), Trend::Down);
    }

    #[test]
    fn only_last_twenty_prices_count() {
        let mut prices = vec![1.0; 30];
        prices.extend([100.0; 10]);
        prices.extend([100.0; 10]);
        assert_eq!(trend(&prices), Trend::Neutral);
    }

    #[test]
    fn zero_prior_mean_is_neutral() {
        assert_eq!(trend(&series(&[0.0; 10], &[5.0; 10])), Trend::Neutral);
    }

    #[test]
    fn display_labels() {
        assert_eq!(Trend::StrongUp.to_string(), "STRONG_UP");
        assert_eq!(Trend::StrongDown.to_string(), "STRONG_DOWN");
        assert_eq!(Trend::Neutral.to_string(), "NEUTRAL");
    }

    #[test]
    fn steady_climb_is_up() {
        let prices: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        assert!(matches!(trend(&prices), Trend::Up | Trend::StrongUp));
    }

    proptest! {
        #[test]
        fn increasing_series_never_trends_down(
            start in 1.0f64..500.0,
            steps in prop::collection::vec(0.001f64..10.0, 19..60),
        ) {
            let mut prices = vec![start];
            for step in steps {
                let next = prices[prices.len() - 1] + step;
                prices.push(next);
            }
            prop_assert!(!matches!(trend(&prices), Trend::Down | Trend::StrongDown));
        }
    }
}
