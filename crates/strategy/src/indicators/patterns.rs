//! Basic candle-shape predicates. Each checks a single bar (or a pair for
//! engulfing forms) and is deliberately strict about degenerate bars: a
//! zero-range candle matches nothing but a doji.

use common::Candle;

fn body(c: &Candle) -> f64 {
    (c.close - c.open).abs()
}

fn range(c: &Candle) -> f64 {
    c.high - c.low
}

fn upper_wick(c: &Candle) -> f64 {
    c.high - c.open.max(c.close)
}

fn lower_wick(c: &Candle) -> f64 {
    c.open.min(c.close) - c.low
}

/// Body no larger than a tenth of the bar's range.
pub fn is_doji(c: &Candle) -> bool {
    range(c) > 0.0 && body(c) <= range(c) * 0.1
}

/// Small body near the top with a long lower shadow.
pub fn is_hammer(c: &Candle) -> bool {
    body(c) > 0.0 && lower_wick(c) >= body(c) * 2.0 && upper_wick(c) <= body(c)
}

/// Small body near the bottom with a long upper shadow.
pub fn is_shooting_star(c: &Candle) -> bool {
    body(c) > 0.0 && upper_wick(c) >= body(c) * 2.0 && lower_wick(c) <= body(c)
}

/// A bullish body that fully wraps the previous bearish body.
pub fn is_bullish_engulfing(prev: &Candle, cur: &Candle) -> bool {
    prev.close < prev.open
        && cur.close > cur.open
        && cur.open <= prev.close
        && cur.close >= prev.open
}

/// A bearish body that fully wraps the previous bullish body.
pub fn is_bearish_engulfing(prev: &Candle, cur: &Candle) -> bool {
    prev.close > prev.open
        && cur.close < cur.open
        && cur.open >= prev.close
        && cur.close <= prev.open
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Candle {
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
    fn doji_has_negligible_body() {
        assert!(is_doji(&bar(100.0, 101.0, 99.0, 100.05)));
        assert!(!is_doji(&bar(100.0, 101.0, 99.0, 100.8)));
    }

    #[test]
    fn hammer_needs_a_long_lower_shadow() {
        assert!(is_hammer(&bar(100.0, 100.6, 97.0, 100.5)));
        assert!(!is_hammer(&bar(100.0, 103.0, 99.8, 100.5)));
    }

    #[test]
    fn shooting_star_mirrors_the_hammer() {
        assert!(is_shooting_star(&bar(100.5, 103.5, 99.9, 100.0)));
        assert!(!is_shooting_star(&bar(100.0, 100.6, 97.0, 100.5)));
    }

    #[test]
    fn engulfing_wraps_the_previous_body() {
        let prev = bar(101.0, 101.5, 99.5, 100.0); // bearish
        let cur = bar(99.8, 102.2, 99.5, 101.8); // bullish, wraps prev body
        assert!(is_bullish_engulfing(&prev, &cur));
        assert!(!is_bearish_engulfing(&prev, &cur));

        let prev = bar(100.0, 101.5, 99.5, 101.0); // bullish
        let cur = bar(101.2, 101.5, 99.0, 99.6); // bearish, wraps prev body
        assert!(is_bearish_engulfing(&prev, &cur));
    }

    #[test]
    fn zero_range_bar_matches_nothing_but_nothing() {
        let flat = bar(100.0, 100.0, 100.0, 100.0);
        assert!(!is_doji(&flat));
        assert!(!is_hammer(&flat));
        assert!(!is_shooting_star(&flat));
    }
}
