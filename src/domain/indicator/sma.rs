//! SMA (Simple Moving Average).
//!
//! SMA(n) = mean of the last n prices. No value until n prices exist.

pub fn sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}
