//! Volume ratio: latest volume / mean volume over the last `window` bars
//! (latest included, fewer if less history exists). 1.0 with no bars or a
//! zero mean.

pub fn volume_ratio(volumes: &[f64], window: usize) -> f64 {
    let Some(&latest) = volumes.last() else {
        return 1.0;
    };
    let n = window.max(1).min(volumes.len());
    let avg = volumes[volumes.len() - n..].iter().sum::<f64>() / n as f64;
    if avg > 0.0 { latest / avg } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_is_neutral() {
        assert_eq!(volume_ratio(&[], 20), 1.0);
    }

    #[test]
    fn zero_volume_is_neutral() {
        assert_eq!(volume_ratio(&[0.0, 0.0], 20), 1.0);
    }

    #[test]
    fn spike_against_window() {
        let mut volumes = vec![100.0; 19];
        volumes.push(300.0);
        // mean over 20 = (1900 + 300) / 20 = 110
        assert_relative_eq!(volume_ratio(&volumes, 20), 300.0 / 110.0);
    }

    #[test]
    fn short_history_uses_what_exists() {
        assert_relative_eq!(volume_ratio(&[100.0, 200.0], 20), 200.0 / 150.0);
    }

    #[test]
    fn window_excludes_older_bars() {
        let volumes = [10_000.0, 100.0, 100.0];
        assert_relative_eq!(volume_ratio(&volumes, 2), 1.0);
    }
}
