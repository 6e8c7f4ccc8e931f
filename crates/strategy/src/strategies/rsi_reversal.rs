use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use common::{AnalysisResult, DataFeed, Error, Result, SignalKind};

use crate::indicators::{
    atr, bollinger, is_bearish_engulfing, is_bullish_engulfing, is_hammer, is_shooting_star, rsi,
};
use crate::result::{FeeSchedule, ResultBuilder};
use crate::Strategy;

const HISTORY_LIMIT: usize = 200;
const MIN_HISTORY: usize = 50;

const RSI_PERIOD: usize = 14;
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const BB_PERIOD: usize = 20;
const BB_WIDTH: f64 = 2.0;
const ATR_PERIOD: usize = 14;

/// Mean-reversion baseline: RSI extremes confirmed by the Bollinger band
/// touched on the same bar, with candle-shape confirmation nudging the
/// confidence. Stops and targets are ATR multiples around the close.
pub struct RsiReversal {
    feed: Arc<dyn DataFeed>,
    fees: FeeSchedule,
}

impl RsiReversal {
    pub const CODE: &'static str = "rsi-reversal";

    pub fn new(feed: Arc<dyn DataFeed>, fees: FeeSchedule) -> Self {
        Self { feed, fees }
    }
}

#[async_trait]
impl Strategy for RsiReversal {
    fn code(&self) -> &'static str {
        Self::CODE
    }

    fn display_name(&self) -> &'static str {
        "RSI Reversal"
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
        let rsi_now = rsi(&closes, RSI_PERIOD);
        let bands = bollinger(&closes, BB_PERIOD, BB_WIDTH);
        let atr_now = atr(&candles, ATR_PERIOD);
        debug!(symbol, rsi = rsi_now, close = last, "rsi-reversal snapshot");

        let prev_candle = &candles[candles.len() - 2];
        let last_candle = &candles[candles.len() - 1];
        let bullish_shape =
            is_bullish_engulfing(prev_candle, last_candle) || is_hammer(last_candle);
        let bearish_shape =
            is_bearish_engulfing(prev_candle, last_candle) || is_shooting_star(last_candle);

        let (signal, mut confidence, description) = if rsi_now <= RSI_OVERSOLD
            && last <= bands.lower
        {
            (
                SignalKind::Buy,
                55.0 + (RSI_OVERSOLD - rsi_now) * 1.5,
                format!("RSI {rsi_now:.1} oversold with the close under the lower band"),
            )
        } else if rsi_now >= RSI_OVERBOUGHT && last >= bands.upper {
            (
                SignalKind::Sell,
                55.0 + (rsi_now - RSI_OVERBOUGHT) * 1.5,
                format!("RSI {rsi_now:.1} overbought with the close over the upper band"),
            )
        } else if rsi_now <= RSI_OVERSOLD + 5.0 || rsi_now >= RSI_OVERBOUGHT - 5.0 {
            (
                SignalKind::Wait,
                40.0,
                format!("RSI {rsi_now:.1} stretched but not band-confirmed"),
            )
        } else {
            (
                SignalKind::Neutral,
                30.0,
                format!("RSI {rsi_now:.1} inside the neutral zone"),
            )
        };

        let mut builder = ResultBuilder::new(format!("{} — {symbol}", self.display_name()))
            .description(description)
            .signal(signal)
            .amount(amount)
            .fee_schedule(self.fees)
            .indicator("rsi", rsi_now)
            .indicator("bb_upper", bands.upper)
            .indicator("bb_middle", bands.middle)
            .indicator("bb_lower", bands.lower)
            .indicator("atr", atr_now)
            .indicator("close", last);

        if signal == SignalKind::Buy && bullish_shape {
            confidence += 10.0;
            builder = builder.note("bullish candle shape on the signal bar");
        }
        if signal == SignalKind::Sell && bearish_shape {
            confidence += 10.0;
            builder = builder.note("bearish candle shape on the signal bar");
        }

        let (stop, target) = match signal {
            SignalKind::Sell => (last + 2.0 * atr_now, last - 3.0 * atr_now),
            // Reference levels for a long read, also used for NEUTRAL/WAIT
            // so the record stays structurally complete.
            _ => (last - 2.0 * atr_now, last + 3.0 * atr_now),
        };

        builder.confidence(confidence).levels(last, stop, target).build()
    }
}
