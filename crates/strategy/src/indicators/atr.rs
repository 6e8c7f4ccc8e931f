use common::Candle;

/// True range of `current` against the previous close.
pub fn true_range(current: &Candle, previous: &Candle) -> f64 {
    let hl = current.high - current.low;
    let hc = (current.high - previous.close).abs();
    let lc = (current.low - previous.close).abs();
    hl.max(hc).max(lc)
}

/// Wilder-smoothed average true range.
///
/// With fewer than `period + 1` candles this degrades to the plain mean of
/// the available true ranges; a single candle yields its high-low span.
pub fn atr(candles: &[Candle], period: usize) -> f64 {
    if period == 0 {
        return 0.0;
    }
    match candles {
        [] => 0.0,
        [only] => only.high - only.low,
        _ => {
            let trs: Vec<f64> = candles
                .windows(2)
                .map(|w| true_range(&w[1], &w[0]))
                .collect();
            if trs.len() <= period {
                return trs.iter().sum::<f64>() / trs.len() as f64;
            }
            let mut atr = trs[..period].iter().sum::<f64>() / period as f64;
            for &tr in &trs[period..] {
                atr = (atr * (period - 1) as f64 + tr) / period as f64;
            }
            atr
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open_time: 0,
            open,
            high,
            low,
            close,
            volume: 1.0,
            close_time: 1,
            quote_volume: 1.0,
        }
    }

    #[test]
    fn true_range_covers_gaps() {
        let prev = candle(10.0, 11.0, 9.0, 10.0);
        // Gap up: the range to the previous close dominates the bar's span.
        let cur = candle(15.0, 16.0, 14.5, 15.5);
        assert!((true_range(&cur, &prev) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn constant_range_series_converges_to_that_range() {
        let candles: Vec<Candle> = (0..30)
            .map(|_| candle(10.0, 11.0, 9.0, 10.0))
            .collect();
        assert!((atr(&candles, 14) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn degrades_on_short_input() {
        assert_eq!(atr(&[], 14), 0.0);
        let one = vec![candle(10.0, 12.0, 9.0, 11.0)];
        assert!((atr(&one, 14) - 3.0).abs() < 1e-12);
    }
}
