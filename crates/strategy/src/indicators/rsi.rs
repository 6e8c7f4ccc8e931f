/// Relative Strength Index with Wilder smoothing, bounded [0, 100].
///
/// Fewer than `period + 1` closes returns the neutral 50; a series with no
/// average loss returns 100.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return 50.0;
    }

    // First average gain/loss over the initial `period` changes
    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let initial = &changes[..period];

    let mut avg_gain = initial.iter().filter(|&&c| c > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss = initial.iter().filter(|&&c| c < 0.0).map(|c| c.abs()).sum::<f64>()
        / period as f64;

    // Wilder smoothing over remaining changes
    for &change in &changes[period..] {
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { change.abs() } else { 0.0 };
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_neutral() {
        let prices = vec![100.0; 14];
        assert_eq!(rsi(&prices, 14), 50.0);
        assert_eq!(rsi(&[], 14), 50.0);
    }

    #[test]
    fn all_gains_returns_100() {
        let prices = vec![10.0, 11.0, 12.0, 13.0, 14.0];
        let value = rsi(&prices, 3);
        assert!((value - 100.0).abs() < 1e-6, "expected ~100, got {value}");
    }

    #[test]
    fn all_losses_returns_0() {
        let prices = vec![14.0, 13.0, 12.0, 11.0, 10.0];
        let value = rsi(&prices, 3);
        assert!(value.abs() < 1e-6, "expected ~0, got {value}");
    }

    #[test]
    fn mixed_series_stays_in_range() {
        let prices = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.15, 43.61, 44.33, 44.83, 45.10,
            45.15, 44.34, 44.09,
        ];
        let value = rsi(&prices, 14);
        assert!((0.0..=100.0).contains(&value), "RSI out of range: {value}");
    }

    #[test]
    fn flat_series_has_no_losses() {
        // No change means no average loss, which maps to 100 by convention.
        let prices = vec![5.0; 20];
        assert_eq!(rsi(&prices, 14), 100.0);
    }
}
