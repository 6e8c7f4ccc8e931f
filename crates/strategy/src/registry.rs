use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use common::DataFeed;

use crate::result::FeeSchedule;
use crate::strategies::{MacdTrend, RsiReversal};
use crate::Strategy;

type Constructor = fn(Arc<dyn DataFeed>, FeeSchedule) -> Box<dyn Strategy>;

fn make_rsi_reversal(feed: Arc<dyn DataFeed>, fees: FeeSchedule) -> Box<dyn Strategy> {
    Box::new(RsiReversal::new(feed, fees))
}

fn make_macd_trend(feed: Arc<dyn DataFeed>, fees: FeeSchedule) -> Box<dyn Strategy> {
    Box::new(MacdTrend::new(feed, fees))
}

/// Fixed registration table. The first entry is the baseline strategy used
/// for unknown codes.
const TABLE: &[(&str, &str, Constructor)] = &[
    (RsiReversal::CODE, "RSI Reversal", make_rsi_reversal),
    (MacdTrend::CODE, "MACD Trend", make_macd_trend),
];

/// Code and display name of one registered strategy.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyInfo {
    pub code: &'static str,
    pub display_name: &'static str,
}

/// Maps strategy codes to constructors and wires the shared data feed and
/// fee schedule into each instance. Construction performs no network I/O.
pub struct StrategyRegistry {
    feed: Arc<dyn DataFeed>,
    fees: FeeSchedule,
}

impl StrategyRegistry {
    pub fn new(feed: Arc<dyn DataFeed>, fees: FeeSchedule) -> Self {
        Self { feed, fees }
    }

    /// Instantiate the strategy registered under `code`, or the baseline
    /// strategy when the code is unknown.
    pub fn create(&self, code: &str) -> Box<dyn Strategy> {
        let entry = TABLE.iter().find(|(c, _, _)| *c == code).unwrap_or_else(|| {
            warn!(code, baseline = TABLE[0].0, "unknown strategy code — using baseline");
            &TABLE[0]
        });
        (entry.2)(Arc::clone(&self.feed), self.fees)
    }

    pub fn list_available(&self) -> Vec<StrategyInfo> {
        TABLE
            .iter()
            .map(|&(code, display_name, _)| StrategyInfo { code, display_name })
            .collect()
    }
}
