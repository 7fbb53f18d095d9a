// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Arithmetic mean of the trailing `period` closes. The dashboard's
// `ema_fast` / `ema_slow` columns are filled with this trailing mean (12 and
// 26 closes), not an exponentially weighted one.
// =============================================================================

/// Mean of the last `period` values of `closes`.
///
/// Returns `None` when `period == 0` or fewer than `period` values exist.
pub fn simple_mean(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;

    mean.is_finite().then_some(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_trailing_window() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        // Last 12 values are 19..=30.
        assert!((simple_mean(&closes, 12).unwrap() - 24.5).abs() < 1e-10);
        // Last 26 values are 5..=30.
        assert!((simple_mean(&closes, 26).unwrap() - 17.5).abs() < 1e-10);
    }

    #[test]
    fn exact_window_length() {
        let closes = vec![2.0, 4.0, 6.0];
        assert_eq!(simple_mean(&closes, 3), Some(4.0));
    }

    #[test]
    fn insufficient_data() {
        assert!(simple_mean(&[1.0, 2.0], 3).is_none());
        assert!(simple_mean(&[1.0, 2.0], 0).is_none());
    }
}
