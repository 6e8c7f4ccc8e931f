/// Simple moving average of the last `period` values.
///
/// Shorter input degrades to the mean of whatever is available.
pub fn sma(values: &[f64], period: usize) -> f64 {
    if values.is_empty() || period == 0 {
        return 0.0;
    }
    let window = &values[values.len().saturating_sub(period)..];
    window.iter().sum::<f64>() / window.len() as f64
}

/// Exponential moving average over the whole sequence.
///
/// Seeded with the SMA of the first `period` values, then the recurrence
/// `ema = price·k + ema·(1−k)` with `k = 2/(period+1)`.
pub fn ema(values: &[f64], period: usize) -> f64 {
    if values.is_empty() || period == 0 {
        return 0.0;
    }
    let seed_len = period.min(values.len());
    let mut ema = values[..seed_len].iter().sum::<f64>() / seed_len as f64;
    let k = 2.0 / (period as f64 + 1.0);
    for &price in &values[seed_len..] {
        ema = price * k + ema * (1.0 - k);
    }
    ema
}

/// EMA at every bar from index `period − 1` onward. Empty when the input is
/// shorter than `period`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(current);
    for &price in &values[period..] {
        current = price * k + current * (1.0 - k);
        out.push(current);
    }
    out
}
