//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n price changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: n + 1 prices are needed for the first value.

/// Value callers substitute while RSI is still warming up.
pub const NEUTRAL_RSI: f64 = 50.0;

fn split_change(change: f64) -> (f64, f64) {
    let gain = if change > 0.0 { change } else { 0.0 };
    let loss = if change < 0.0 { -change } else { 0.0 };
    (gain, loss)
}

fn smooth(avg: f64, current: f64, period: usize) -> f64 {
    (avg * (period - 1) as f64 + current) / period as f64
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// RSI over the whole of `prices`, or `None` with fewer than `period + 1` points.
///
/// This is a single pass over the full sequence; see [`RsiState`] for a rolling
/// computation that yields identical values one price at a time.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for i in 1..=period {
        let (gain, loss) = split_change(prices[i] - prices[i - 1]);
        gain_sum += gain;
        loss_sum += loss;
    }

    let mut avg_gain = gain_sum / period as f64;
    let mut avg_loss = loss_sum / period as f64;

    for i in (period + 1)..prices.len() {
        let (gain, loss) = split_change(prices[i] - prices[i - 1]);
        avg_gain = smooth(avg_gain, gain, period);
        avg_loss = smooth(avg_loss, loss, period);
    }

    Some(rsi_from_averages(avg_gain, avg_loss))
}

/// Rolling RSI fed one closing price at a time.
///
/// After `update` has seen prices `p[0..=i]` its result equals `rsi(&p[..=i], period)`
/// exactly: the seed sums and the smoothing steps run in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiState {
    period: usize,
    prev_price: Option<f64>,
    changes_seen: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
    value: Option<f64>,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        RsiState {
            period,
            prev_price: None,
            changes_seen: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            value: None,
        }
    }

    /// Feed the next close; returns the latest RSI, `None` until the warm-up
    /// window is filled.
    pub fn update(&mut self, price: f64) -> Option<f64> {
        let Some(prev) = self.prev_price.replace(price) else {
            return None;
        };
        if self.period == 0 {
            return None;
        }

        let (gain, loss) = split_change(price - prev);
        self.changes_seen += 1;

        if self.changes_seen <= self.period {
            self.gain_sum += gain;
            self.loss_sum += loss;
            if self.changes_seen == self.period {
                self.avg_gain = self.gain_sum / self.period as f64;
                self.avg_loss = self.loss_sum / self.period as f64;
                self.value = Some(rsi_from_averages(self.avg_gain, self.avg_loss));
            }
        } else {
            self.avg_gain = smooth(self.avg_gain, gain, self.period);
            self.avg_loss = smooth(self.avg_loss, loss, self.period);
            self.value = Some(rsi_from_averages(self.avg_gain, self.avg_loss));
        }

        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rsi_empty_prices() {
        assert_eq!(rsi(&[], 14), None);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        assert_eq!(rsi(&prices[..14], 14), None);
        assert!(rsi(&prices, 14).is_some());
    }

    #[test]
    fn rsi_zero_period() {
        assert_eq!(rsi(&[100.0, 101.0], 0), None);
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&prices, 14), Some(100.0));
    }

    #[test]
    fn rsi_flat_prices_is_100() {
        let prices = vec![50.0; 20];
        assert_eq!(rsi(&prices, 14), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let value = rsi(&prices, 14).unwrap();
        assert!((value - 0.0).abs() < f64::EPSILON, "RSI should be 0 when all losses");
    }

    #[test]
    fn rsi_known_calculation() {
        let prices = [
            44.0, 44.25, 44.50, 43.75, 44.50, 44.25, 44.75, 45.25, 45.50, 45.25, 45.50, 46.0,
            46.25, 46.0, 46.50,
        ];
        // gains: 0.25+0.25+0.75+0.5+0.5+0.25+0.25+0.5+0.25+0.5 = 4.0
        // losses: 0.75+0.25+0.25+0.25 = 1.5
        let expected = 100.0 - 100.0 / (1.0 + (4.0 / 14.0) / (1.5 / 14.0));
        let value = rsi(&prices, 14).unwrap();
        assert!((value - expected).abs() < 1e-9);
        assert!(value > 50.0 && value < 100.0, "RSI should be in bullish territory");
    }

    #[test]
    fn rsi_wilder_smoothing_step() {
        // period 2: changes +2, -1, +3
        let prices = [10.0, 12.0, 11.0, 14.0];
        let avg_gain = ((2.0 / 2.0) * 1.0 + 3.0) / 2.0;
        let avg_loss = ((1.0 / 2.0) * 1.0 + 0.0) / 2.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert!((rsi(&prices, 2).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn state_warms_up_like_reference() {
        let mut state = RsiState::new(3);
        assert_eq!(state.update(10.0), None);
        assert_eq!(state.update(11.0), None);
        assert_eq!(state.update(10.5), None);
        assert_eq!(state.update(12.0), rsi(&[10.0, 11.0, 10.5, 12.0], 3));
        assert!(state.update(12.0).is_some());
    }

    #[test]
    fn state_zero_period_never_produces() {
        let mut state = RsiState::new(0);
        for p in [1.0, 2.0, 3.0] {
            assert_eq!(state.update(p), None);
        }
    }

    proptest! {
        #[test]
        fn rsi_is_bounded(prices in prop::collection::vec(1.0f64..1000.0, 15..120)) {
            let value = rsi(&prices, 14).unwrap();
            prop_assert!((0.0..=100.0).contains(&value), "RSI {} out of range", value);
        }

        #[test]
        fn rolling_matches_reference_bit_for_bit(
            prices in prop::collection::vec(1.0f64..1000.0, 0..80),
            period in 1usize..20,
        ) {
            let mut state = RsiState::new(period);
            for i in 0..prices.len() {
                let rolling = state.update(prices[i]);
                let reference = rsi(&prices[..=i], period);
                prop_assert_eq!(rolling.map(f64::to_bits), reference.map(f64::to_bits));
            }
        }
    }
}
