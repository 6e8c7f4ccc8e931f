use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One closed OHLCV interval in the canonical representation.
///
/// Every adapter normalizes its upstream payload into this shape before the
/// rest of the system sees it. Timestamps are UTC epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
    /// Volume expressed in the quote asset.
    pub quote_volume: f64,
}

impl Candle {
    /// A candle is well formed when `low <= open,close <= high` and the
    /// interval has positive duration.
    pub fn is_well_formed(&self) -> bool {
        self.low <= self.high
            && self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high
            && self.open_time < self.close_time
    }
}

/// Sort ascending by `open_time`, drop duplicate timestamps, and reject
/// malformed bars. An empty input is a provider failure, not a valid series.
pub fn normalize_candles(mut candles: Vec<Candle>) -> Result<Vec<Candle>> {
    if candles.is_empty() {
        return Err(Error::InvalidNumericInput(
            "provider returned an empty candle series".into(),
        ));
    }
    if let Some(bad) = candles.iter().find(|c| !c.is_well_formed()) {
        return Err(Error::InvalidNumericInput(format!(
            "malformed candle at open_time {}",
            bad.open_time
        )));
    }
    candles.sort_by_key(|c| c.open_time);
    candles.dedup_by_key(|c| c.open_time);
    Ok(candles)
}

/// Latest traded price for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub price: f64,
    /// UTC epoch milliseconds at which the reading was taken.
    pub timestamp: i64,
}

impl Ticker {
    /// A zero or negative price is a provider failure, never a valid reading.
    pub fn validated(self) -> Result<Ticker> {
        if self.price > 0.0 && self.price.is_finite() {
            Ok(self)
        } else {
            Err(Error::InvalidNumericInput(format!(
                "non-positive price {} for {}",
                self.price, self.symbol
            )))
        }
    }
}

/// Static capabilities of one provider adapter, read by the fallback router
/// to filter and clamp requests before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Unique code identifying the adapter (e.g. "binance").
    pub code: String,
    pub display_name: String,
    /// Lower priority is tried first.
    pub priority: i32,
    /// Canonical interval tokens this source serves. Empty = all.
    pub supported_intervals: HashSet<String>,
    /// Largest candle count a single history request may return.
    pub max_history_limit: usize,
}

impl ProviderDescriptor {
    pub fn supports_interval(&self, interval: &str) -> bool {
        self.supported_intervals.is_empty() || self.supported_intervals.contains(interval)
    }

    pub fn clamp_limit(&self, limit: usize) -> usize {
        limit.min(self.max_history_limit)
    }
}

/// Rate-limit snapshot reported by an adapter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub requests_per_minute: u32,
    pub requests_remaining: u32,
}

/// Shape of the raw payload an upstream source returns, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// Rows encoded as positional JSON arrays (Binance klines style).
    JsonArrays,
    /// Rows encoded as keyed JSON objects.
    JsonObjects,
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFormat::JsonArrays => write!(f, "json-arrays"),
            DataFormat::JsonObjects => write!(f, "json-objects"),
        }
    }
}

/// Exchange metadata for one listed symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub status: String,
}

/// Direction of a strategy's recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
    Sell,
    Neutral,
    Wait,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
            SignalKind::Neutral => write!(f, "NEUTRAL"),
            SignalKind::Wait => write!(f, "WAIT"),
        }
    }
}

/// Trading fee estimate broken down by component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Maker/taker base fee on the traded amount.
    pub base: f64,
    /// Auxiliary exchange levy on the traded amount.
    pub levy: f64,
    /// Tax applied on top of the fee itself.
    pub tax: f64,
    pub total: f64,
}

/// Canonical strategy output. Field names are fixed — external consumers
/// (CLI, notification dispatch) deserialize this shape verbatim.
///
/// Only the shared result builder in the strategy crate constructs this;
/// strategy-specific extras go into `indicators` and `notes`, never as ad hoc
/// top-level fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    pub description: String,
    pub signal: SignalKind,
    /// Clamped to [0, 100].
    pub confidence: f64,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Formatted as "1:N".
    pub risk_reward: String,
    pub fee: FeeBreakdown,
    pub potential_profit: f64,
    pub potential_loss: f64,
    pub indicators: BTreeMap<String, serde_json::Value>,
    pub notes: Vec<String>,
}
