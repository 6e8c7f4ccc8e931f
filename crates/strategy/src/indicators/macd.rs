use super::ma::ema;

/// MACD decomposition at the last bar. The histogram is exactly
/// `macd − signal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Crossover state between the last two bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdCross {
    Bullish,
    Bearish,
    Neutral,
}

/// MACD line (`EMA(fast) − EMA(slow)`) for each prefix long enough to cover
/// the slow period. Empty when the input is shorter than `slow`.
pub fn macd_line(closes: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    if fast == 0 || slow == 0 || closes.len() < slow {
        return Vec::new();
    }
    (slow - 1..closes.len())
        .map(|i| {
            let prefix = &closes[..=i];
            ema(prefix, fast) - ema(prefix, slow)
        })
        .collect()
}

/// MACD line, signal line, and histogram at the last bar. Degrades to an
/// all-zero reading when there is not enough history for the slow EMA.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let line = macd_line(closes, fast, slow);
    let Some(&macd_now) = line.last() else {
        return Macd { macd: 0.0, signal: 0.0, histogram: 0.0 };
    };
    let signal_now = ema(&line, signal);
    Macd {
        macd: macd_now,
        signal: signal_now,
        histogram: macd_now - signal_now,
    }
}

/// Whether the MACD line crossed the signal line on the latest bar.
pub fn macd_cross(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdCross {
    let line = macd_line(closes, fast, slow);
    if signal == 0 || line.len() < signal + 1 {
        return MacdCross::Neutral;
    }

    let prev_macd = line[line.len() - 2];
    let curr_macd = line[line.len() - 1];
    let prev_signal = ema(&line[..line.len() - 1], signal);
    let curr_signal = ema(&line, signal);

    if prev_macd <= prev_signal && curr_macd > curr_signal {
        MacdCross::Bullish
    } else if prev_macd >= prev_signal && curr_macd < curr_signal {
        MacdCross::Bearish
    } else {
        MacdCross::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_is_exactly_line_minus_signal() {
        let prices: Vec<f64> = (0..80).map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0).collect();
        let m = macd(&prices, 12, 26, 9);
        assert_eq!(m.histogram, m.macd - m.signal);
    }

    #[test]
    fn short_input_degrades_to_zero_reading() {
        let prices = vec![100.0; 10];
        let m = macd(&prices, 12, 26, 9);
        assert_eq!(m.macd, 0.0);
        assert_eq!(m.signal, 0.0);
        assert_eq!(m.histogram, 0.0);
        assert_eq!(macd_cross(&prices, 12, 26, 9), MacdCross::Neutral);
    }

    #[test]
    fn downtrend_reversal_produces_bullish_cross() {
        // Long decline followed by a sharp rally has to cross bullish at
        // some bar; scan for it the way a strategy scanning history would.
        let mut prices: Vec<f64> = (0..40).map(|i| 200.0 - i as f64).collect();
        prices.extend((0..40).map(|i| 160.0 + i as f64 * 3.0));

        let crossed = (30..prices.len())
            .any(|i| macd_cross(&prices[..i], 5, 10, 4) == MacdCross::Bullish);
        assert!(crossed, "expected a bullish crossover during the rally");
    }

    #[test]
    fn steady_trend_does_not_cross() {
        let prices: Vec<f64> = (0..80).map(|i| 100.0 + i as f64 * 0.5).collect();
        // Once the trend is established the line stays above the signal.
        assert_eq!(macd_cross(&prices, 5, 10, 4), MacdCross::Neutral);
    }

    #[test]
    fn line_length_tracks_input() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        assert_eq!(macd_line(&prices, 12, 26).len(), 60 - 26 + 1);
    }
}
