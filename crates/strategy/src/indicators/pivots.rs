use common::Candle;

/// Indices whose value is the minimum within `window` bars on each side.
/// Ties count as pivots. The first and last `window` bars can never qualify.
pub fn pivot_lows(values: &[f64], window: usize) -> Vec<usize> {
    if window == 0 || values.len() < 2 * window + 1 {
        return Vec::new();
    }
    (window..values.len() - window)
        .filter(|&i| values[i - window..=i + window].iter().all(|&v| values[i] <= v))
        .collect()
}

/// Indices whose value is the maximum within `window` bars on each side.
pub fn pivot_highs(values: &[f64], window: usize) -> Vec<usize> {
    if window == 0 || values.len() < 2 * window + 1 {
        return Vec::new();
    }
    (window..values.len() - window)
        .filter(|&i| values[i - window..=i + window].iter().all(|&v| values[i] >= v))
        .collect()
}

/// Support prices: the lows at pivot-low bars, oldest first.
pub fn support_levels(candles: &[Candle], window: usize) -> Vec<f64> {
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    pivot_lows(&lows, window).into_iter().map(|i| lows[i]).collect()
}

/// Resistance prices: the highs at pivot-high bars, oldest first.
pub fn resistance_levels(candles: &[Candle], window: usize) -> Vec<f64> {
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    pivot_highs(&highs, window).into_iter().map(|i| highs[i]).collect()
}
