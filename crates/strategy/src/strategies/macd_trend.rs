use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use common::{AnalysisResult, DataFeed, Error, Result, SignalKind};

use crate::indicators::{
    atr, ema, macd, macd_cross, resistance_levels, retracement, support_levels, MacdCross,
};
use crate::result::{FeeSchedule, ResultBuilder};
use crate::Strategy;

const HISTORY_LIMIT: usize = 300;
const MIN_HISTORY: usize = 60;

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const TREND_EMA: usize = 50;
const PIVOT_WINDOW: usize = 5;
const ATR_PERIOD: usize = 14;
const SWING_LOOKBACK: usize = 100;

/// Trend-following strategy: a MACD signal-line crossover taken only in the
/// direction of the EMA trend filter. Stops and targets come from the
/// nearest pivot support/resistance, falling back to ATR multiples when no
/// pivot sits on the right side of the price.
pub struct MacdTrend {
    feed: Arc<dyn DataFeed>,
    fees: FeeSchedule,
}

impl MacdTrend {
    pub const CODE: &'static str = "macd-trend";

    pub fn new(feed: Arc<dyn DataFeed>, fees: FeeSchedule) -> Self {
        Self { feed, fees }
    }
}

#[async_trait]
impl Strategy for MacdTrend {
    fn code(&self) -> &'static str {
        Self::CODE
    }

    fn display_name(&self) -> &'static str {
        "MACD Trend"
    }

    async fn analyze(&self, symbol: &str, amount: f64, interval: &str) -> Result<AnalysisResult> {
        let candles = self.feed.historical(symbol, interval, HISTORY_LIMIT).await?;
        if candles.len() < MIN_HISTORY {
            return Err(Error::InsufficientHistory {
                required: MIN_HISTORY,
                got: candles.len(),
            });
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let last = closes[closes.len() - 1];
        let m = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let cross = macd_cross(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let trend = ema(&closes, TREND_EMA);
        let atr_now = atr(&candles, ATR_PERIOD);
        debug!(symbol, histogram = m.histogram, trend, "macd-trend snapshot");

        let supports = support_levels(&candles, PIVOT_WINDOW);
        let resistances = resistance_levels(&candles, PIVOT_WINDOW);
        let support_below = supports
            .iter()
            .copied()
            .filter(|&s| s < last)
            .fold(None::<f64>, |best, s| Some(best.map_or(s, |b| b.max(s))));
        let resistance_above = resistances
            .iter()
            .copied()
            .filter(|&r| r > last)
            .fold(None::<f64>, |best, r| Some(best.map_or(r, |b| b.min(r))));

        // Swing range for the retracement snapshot.
        let swing = &candles[candles.len().saturating_sub(SWING_LOOKBACK)..];
        let swing_high = swing.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let swing_low = swing.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let fib = retracement(swing_high, swing_low);
        let (fib_name, fib_level) = fib.nearest(last);

        let histogram_strength = if last > 0.0 {
            (m.histogram.abs() / last * 10_000.0).min(20.0)
        } else {
            0.0
        };

        let (signal, confidence, description) = match cross {
            MacdCross::Bullish if last > trend => (
                SignalKind::Buy,
                60.0 + histogram_strength,
                "bullish MACD crossover above the trend EMA".to_string(),
            ),
            MacdCross::Bearish if last < trend => (
                SignalKind::Sell,
                60.0 + histogram_strength,
                "bearish MACD crossover below the trend EMA".to_string(),
            ),
            MacdCross::Bullish | MacdCross::Bearish => (
                SignalKind::Wait,
                45.0,
                "MACD crossover against the prevailing trend".to_string(),
            ),
            MacdCross::Neutral => (
                SignalKind::Neutral,
                30.0,
                "no MACD crossover on the latest bar".to_string(),
            ),
        };

        let (stop, target) = match signal {
            SignalKind::Sell => (
                resistance_above.unwrap_or(last + 2.0 * atr_now),
                support_below.unwrap_or(last - 3.0 * atr_now),
            ),
            _ => (
                support_below.unwrap_or(last - 2.0 * atr_now),
                resistance_above.unwrap_or(last + 3.0 * atr_now),
            ),
        };

        ResultBuilder::new(format!("{} — {symbol}", self.display_name()))
            .description(description)
            .signal(signal)
            .confidence(confidence)
            .levels(last, stop, target)
            .amount(amount)
            .fee_schedule(self.fees)
            .indicator("macd", m.macd)
            .indicator("macd_signal", m.signal)
            .indicator("macd_histogram", m.histogram)
            .indicator("trend_ema", trend)
            .indicator("atr", atr_now)
            .indicator("close", last)
            .indicator("swing_high", swing_high)
            .indicator("swing_low", swing_low)
            .indicator(format!("fib_{fib_name}"), fib_level)
            .note(format!("nearest retracement level {fib_name}% at {fib_level:.2}"))
            .build()
    }
}
