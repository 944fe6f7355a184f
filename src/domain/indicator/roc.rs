//! ROC (Rate of Change) over a lookback.
//!
//! ROC(n) = ((C[last] - C[last-n]) / C[last-n]) * 100
//! No value with fewer than n + 1 prices, n == 0, or a zero base price.

pub fn roc(prices: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || prices.len() < lookback + 1 {
        return None;
    }
    let last = prices[prices.len() - 1];
    let base = prices[prices.len() - 1 - lookback];
    if base == 0.0 {
        return None;
    }
    Some((last - base) / base * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn roc_basic() {
        assert_relative_eq!(roc(&[100.0, 97.0, 94.0], 2).unwrap(), -6.0);
        assert_relative_eq!(roc(&[100.0, 97.0, 94.0], 1).unwrap(), (94.0 - 97.0) / 97.0 * 100.0);
    }

    #[test]
    fn roc_warmup() {
        assert_eq!(roc(&[100.0, 97.0], 2), None);
        assert_eq!(roc(&[], 1), None);
    }

    #[test]
    fn roc_zero_lookback() {
        assert_eq!(roc(&[100.0, 97.0], 0), None);
    }

    #[test]
    fn roc_zero_base() {
        assert_eq!(roc(&[0.0, 5.0], 1), None);
    }
}
