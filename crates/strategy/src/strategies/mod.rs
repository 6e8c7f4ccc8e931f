pub mod macd_trend;
pub mod rsi_reversal;

pub use macd_trend::MacdTrend;
pub use rsi_reversal::RsiReversal;
