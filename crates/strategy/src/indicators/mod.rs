//! Pure, stateless indicator functions over price/volume sequences.
//!
//! Every function tolerates short input by degrading to a best-effort or
//! neutral value instead of panicking — strategies rely on this when an
//! asset has sparse history.

pub mod atr;
pub mod bollinger;
pub mod fibonacci;
pub mod ma;
pub mod macd;
pub mod patterns;
pub mod pivots;
pub mod rsi;

pub use atr::{atr, true_range};
pub use bollinger::{bollinger, Bands};
pub use fibonacci::{retracement, FibLevels};
pub use ma::{ema, ema_series, sma};
pub use macd::{macd, macd_cross, macd_line, Macd, MacdCross};
pub use patterns::{
    is_bearish_engulfing, is_bullish_engulfing, is_doji, is_hammer, is_shooting_star,
};
pub use pivots::{pivot_highs, pivot_lows, resistance_levels, support_levels};
pub use rsi::rsi;
