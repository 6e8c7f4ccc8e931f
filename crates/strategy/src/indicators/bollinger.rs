use super::ma::sma;

/// Volatility bands around the period SMA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bands at `k` population standard deviations around the `period` SMA,
/// both computed over the same trailing window.
pub fn bollinger(closes: &[f64], period: usize, k: f64) -> Bands {
    if closes.is_empty() || period == 0 {
        return Bands { upper: 0.0, middle: 0.0, lower: 0.0 };
    }
    let window = &closes[closes.len().saturating_sub(period)..];
    let middle = sma(closes, period);
    let variance =
        window.iter().map(|v| (v - middle).powi(2)).sum::<f64>() / window.len() as f64;
    let offset = k * variance.sqrt();
    Bands {
        upper: middle + offset,
        middle,
        lower: middle - offset,
    }
}
