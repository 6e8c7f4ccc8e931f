use async_trait::async_trait;

use crate::{Candle, DataFormat, ProviderDescriptor, RateLimitInfo, Result, SymbolInfo, Ticker};

/// Contract every upstream market-data source implements.
///
/// Implementations fetch raw payloads and hand back the canonical model; a
/// network, parse, or upstream-rejection failure surfaces as a single typed
/// error, never as a partially filled result. Empty payloads are failures.
///
/// Adapters are held as `Arc<dyn MarketDataProvider>` by the provider
/// registry and dispatched by the fallback router.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Static capabilities: code, priority, supported intervals, history cap.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Unique adapter code, shorthand for `descriptor().code`.
    fn code(&self) -> &str {
        &self.descriptor().code
    }

    /// Fetch and normalize candle history, oldest first, ascending and
    /// deduplicated by open time.
    async fn historical(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>>;

    /// Latest traded price for one symbol.
    async fn ticker(&self, symbol: &str) -> Result<Ticker>;

    /// Latest traded prices for several symbols in one upstream round trip
    /// where the source supports it.
    async fn tickers(&self, symbols: &[String]) -> Result<Vec<Ticker>>;

    /// Exchange metadata, for one symbol or the whole listing when `None`.
    async fn symbol_info(&self, symbol: Option<&str>) -> Result<Vec<SymbolInfo>>;

    /// Source-reported liveness, independent of the registry's own blacklist.
    async fn is_available(&self) -> bool {
        true
    }

    fn rate_limit(&self) -> RateLimitInfo;

    fn data_format(&self) -> DataFormat;
}

/// The narrow surface strategies consume. Implemented by the fallback router
/// so strategy code never touches individual providers.
#[async_trait]
pub trait DataFeed: Send + Sync {
    async fn historical(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>>;

    async fn ticker(&self, symbol: &str) -> Result<Ticker>;
}
