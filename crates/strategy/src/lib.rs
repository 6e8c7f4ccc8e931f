pub mod indicators;
pub mod registry;
pub mod result;
pub mod strategies;

pub use registry::{StrategyInfo, StrategyRegistry};
pub use result::{FeeSchedule, ResultBuilder};

use async_trait::async_trait;

use common::{AnalysisResult, Result};

/// All strategy implementations must satisfy this trait.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Stable registry code (e.g. "rsi-reversal").
    fn code(&self) -> &'static str;

    /// Human-readable name shown in logs and result titles.
    fn display_name(&self) -> &'static str;

    /// Analyze `symbol` over `interval`, sizing projections for a position
    /// of `amount` quote units. Either a complete result or a typed failure;
    /// invalid input data never fabricates a NEUTRAL signal.
    async fn analyze(&self, symbol: &str, amount: f64, interval: &str) -> Result<AnalysisResult>;
}
