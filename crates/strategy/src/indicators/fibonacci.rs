/// Fibonacci retracement levels between a swing high and low, measured
/// downward from the high.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibLevels {
    pub level_236: f64,
    pub level_382: f64,
    pub level_500: f64,
    pub level_618: f64,
    pub level_786: f64,
}

impl FibLevels {
    /// Levels paired with their conventional names, shallow to deep.
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("23.6", self.level_236),
            ("38.2", self.level_382),
            ("50.0", self.level_500),
            ("61.8", self.level_618),
            ("78.6", self.level_786),
        ]
    }

    /// The level closest to `price`.
    pub fn nearest(&self, price: f64) -> (&'static str, f64) {
        let mut best = ("23.6", self.level_236);
        for (name, level) in self.named() {
            if (price - level).abs() < (price - best.1).abs() {
                best = (name, level);
            }
        }
        best
    }
}

pub fn retracement(high: f64, low: f64) -> FibLevels {
    let range = high - low;
    let at = |pct: f64| high - range * pct;
    FibLevels {
        level_236: at(0.236),
        level_382: at(0.382),
        level_500: at(0.500),
        level_618: at(0.618),
        level_786: at(0.786),
    }
}
