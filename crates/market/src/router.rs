use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use common::{
    Candle, DataFeed, Error, MarketDataProvider, ProviderFailure, Result, SymbolInfo, Ticker,
};

use crate::registry::ProviderRegistry;

/// Per-request knobs for the fallback router.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Bypass routing and try only this provider.
    pub forced_provider: Option<String>,
    /// Absolute deadline. When it expires the in-flight attempt and the rest
    /// of the candidate loop are aborted; no partial result is returned.
    pub deadline: Option<Instant>,
}

impl FetchOptions {
    pub fn forced(code: impl Into<String>) -> Self {
        Self {
            forced_provider: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }
}

/// The central resilience algorithm: try candidate providers in order, first
/// success wins, failures blacklist the provider and accumulate until every
/// candidate is exhausted.
///
/// Candidate attempts within one request are strictly sequential; the only
/// state shared with concurrent requests is the registry's availability map.
pub struct FallbackRouter {
    registry: Arc<ProviderRegistry>,
    attempt_timeout: Duration,
}

impl FallbackRouter {
    pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            attempt_timeout: Self::DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Candle history. The limit is clamped per candidate to its declared
    /// maximum before dispatch.
    pub async fn historical_with(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
        opts: &FetchOptions,
    ) -> Result<Vec<Candle>> {
        self.run(symbol, Some(symbol), Some(interval), opts, move |p| {
            let symbol = symbol.to_string();
            let interval = interval.to_string();
            Box::pin(async move {
                let clamped = p.descriptor().clamp_limit(limit);
                p.historical(&symbol, &interval, clamped).await
            })
        })
        .await
    }

    /// Latest price for one symbol.
    pub async fn ticker_with(&self, symbol: &str, opts: &FetchOptions) -> Result<Ticker> {
        self.run(symbol, Some(symbol), None, opts, move |p| {
            let symbol = symbol.to_string();
            Box::pin(async move { p.ticker(&symbol).await })
        })
        .await
    }

    /// Latest prices for a batch of symbols. Batch requests follow the global
    /// priority order; per-coin routing applies to single-symbol calls.
    pub async fn tickers_with(
        &self,
        symbols: &[String],
        opts: &FetchOptions,
    ) -> Result<Vec<Ticker>> {
        let label = symbols.join(",");
        self.run(&label, None, None, opts, move |p| {
            let symbols = symbols.to_vec();
            Box::pin(async move { p.tickers(&symbols).await })
        })
        .await
    }

    /// Exchange metadata for one symbol, or the full listing when `None`.
    pub async fn symbol_info_with(
        &self,
        symbol: Option<&str>,
        opts: &FetchOptions,
    ) -> Result<Vec<SymbolInfo>> {
        let label = symbol.unwrap_or("<all>").to_string();
        self.run(&label, symbol, None, opts, move |p| {
            let symbol = symbol.map(|s| s.to_string());
            Box::pin(async move { p.symbol_info(symbol.as_deref()).await })
        })
        .await
    }

    /// Ordered candidate list for one request: forced provider, else the
    /// symbol's routing rule, else every provider by ascending priority.
    fn candidates(
        &self,
        routing_key: Option<&str>,
        opts: &FetchOptions,
    ) -> Vec<Arc<dyn MarketDataProvider>> {
        if let Some(code) = &opts.forced_provider {
            return self.registry.get(code).into_iter().collect();
        }
        if let Some(symbol) = routing_key {
            if let Some(rule) = self.registry.routing().rule_for(symbol) {
                return rule
                    .candidate_order()
                    .iter()
                    .filter_map(|code| self.registry.get(code))
                    .collect();
            }
        }
        self.registry.list_by_priority()
    }

    /// Time budget for the next attempt, bounded by the caller's deadline.
    /// `None` means the deadline has already passed.
    fn attempt_budget(&self, opts: &FetchOptions) -> Option<Duration> {
        match opts.deadline {
            None => Some(self.attempt_timeout),
            Some(deadline) => {
                let remaining = deadline.checked_duration_since(Instant::now())?;
                if remaining.is_zero() {
                    return None;
                }
                Some(remaining.min(self.attempt_timeout))
            }
        }
    }

    /// One loop shared by every operation: first success wins, failures
    /// accumulate and blacklist, exhaustion aggregates.
    async fn run<T, F>(
        &self,
        label: &str,
        routing_key: Option<&str>,
        interval: Option<&str>,
        opts: &FetchOptions,
        op: F,
    ) -> Result<T>
    where
        F: Fn(Arc<dyn MarketDataProvider>) -> BoxFuture<'static, Result<T>>,
    {
        let mut attempts: Vec<ProviderFailure> = Vec::new();

        for provider in self.candidates(routing_key, opts) {
            let code = provider.descriptor().code.clone();

            // Purely in-memory check — never a network call.
            if !self.registry.availability().is_available(&code) {
                debug!(provider = %code, "skipping blacklisted provider");
                continue;
            }
            if let Some(interval) = interval {
                if !provider.descriptor().supports_interval(interval) {
                    debug!(provider = %code, interval, "interval not supported — skipping");
                    continue;
                }
            }

            let Some(budget) = self.attempt_budget(opts) else {
                warn!(request = %label, "request deadline exceeded — aborting candidate loop");
                attempts.push(ProviderFailure {
                    provider: code,
                    message: "request deadline exceeded".into(),
                });
                break;
            };

            match tokio::time::timeout(budget, op(Arc::clone(&provider))).await {
                Ok(Ok(value)) => {
                    debug!(provider = %code, request = %label, "dispatch succeeded");
                    return Ok(value);
                }
                Ok(Err(e)) => match &e {
                    // Capability mismatch: record, but do not penalize availability.
                    Error::IntervalUnsupported { .. } | Error::SymbolUnsupported { .. } => {
                        debug!(provider = %code, error = %e, "capability mismatch — next candidate");
                        attempts.push(ProviderFailure {
                            provider: code,
                            message: e.to_string(),
                        });
                    }
                    _ => {
                        warn!(provider = %code, error = %e, "provider attempt failed — blacklisting");
                        self.registry
                            .availability()
                            .mark_unavailable(&code, self.registry.availability_ttl());
                        attempts.push(ProviderFailure {
                            provider: code,
                            message: e.to_string(),
                        });
                    }
                },
                Err(_) => {
                    let message = format!("timed out after {:.1}s", budget.as_secs_f64());
                    warn!(provider = %code, %message, "provider attempt timed out — blacklisting");
                    self.registry
                        .availability()
                        .mark_unavailable(&code, self.registry.availability_ttl());
                    attempts.push(ProviderFailure { provider: code, message });
                }
            }
        }

        Err(Error::AllProvidersExhausted {
            symbol: label.to_string(),
            attempts,
        })
    }
}

#[async_trait]
impl DataFeed for FallbackRouter {
    async fn historical(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        self.historical_with(symbol, interval, limit, &FetchOptions::default())
            .await
    }

    async fn ticker(&self, symbol: &str) -> Result<Ticker> {
        self.ticker_with(symbol, &FetchOptions::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use common::{DataFormat, ProviderDescriptor, RateLimitInfo};

    use crate::routing::{CoinRoutingRule, RoutingTable};

    /// Scripted in-process provider for router tests.
    struct MockProvider {
        descriptor: ProviderDescriptor,
        /// Price marker so tests can identify whose result won.
        price: f64,
        fail_with: Option<fn(&str) -> Error>,
        calls: AtomicUsize,
        seen_limit: Mutex<Option<usize>>,
    }

    impl MockProvider {
        fn ok(code: &str, priority: i32, price: f64) -> Arc<Self> {
            Self::build(code, priority, price, None, HashSet::new(), 1000)
        }

        fn failing(code: &str, priority: i32) -> Arc<Self> {
            Self::build(
                code,
                priority,
                0.0,
                Some(|code| Error::ProviderUnavailable {
                    provider: code.into(),
                    reason: "HTTP 502".into(),
                }),
                HashSet::new(),
                1000,
            )
        }

        fn build(
            code: &str,
            priority: i32,
            price: f64,
            fail_with: Option<fn(&str) -> Error>,
            supported_intervals: HashSet<String>,
            max_history_limit: usize,
        ) -> Arc<Self> {
            Arc::new(Self {
                descriptor: ProviderDescriptor {
                    code: code.into(),
                    display_name: code.to_uppercase(),
                    priority,
                    supported_intervals,
                    max_history_limit,
                },
                price,
                fail_with,
                calls: AtomicUsize::new(0),
                seen_limit: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn candles(&self, n: usize) -> Vec<Candle> {
            (0..n as i64)
                .map(|i| Candle {
                    open_time: i * 60_000,
                    open: self.price,
                    high: self.price + 1.0,
                    low: self.price - 1.0,
                    close: self.price,
                    volume: 1.0,
                    close_time: i * 60_000 + 59_999,
                    quote_volume: self.price,
                })
                .collect()
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        async fn historical(&self, _: &str, _: &str, limit: usize) -> Result<Vec<Candle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_limit.lock().unwrap() = Some(limit);
            match self.fail_with {
                Some(make) => Err(make(&self.descriptor.code)),
                None => Ok(self.candles(limit.min(100))),
            }
        }

        async fn ticker(&self, symbol: &str) -> Result<Ticker> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(make) => Err(make(&self.descriptor.code)),
                None => Ok(Ticker {
                    symbol: symbol.into(),
                    price: self.price,
                    timestamp: 0,
                }),
            }
        }

        async fn tickers(&self, symbols: &[String]) -> Result<Vec<Ticker>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(make) => Err(make(&self.descriptor.code)),
                None => Ok(symbols
                    .iter()
                    .map(|s| Ticker { symbol: s.clone(), price: self.price, timestamp: 0 })
                    .collect()),
            }
        }

        async fn symbol_info(&self, _: Option<&str>) -> Result<Vec<SymbolInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        fn rate_limit(&self) -> RateLimitInfo {
            RateLimitInfo { requests_per_minute: 60, requests_remaining: 60 }
        }

        fn data_format(&self) -> DataFormat {
            DataFormat::JsonObjects
        }
    }

    fn router_with(providers: &[Arc<MockProvider>], routing: RoutingTable) -> FallbackRouter {
        let mut registry = ProviderRegistry::new(routing);
        for p in providers {
            registry.register(Arc::clone(p) as Arc<dyn MarketDataProvider>);
        }
        FallbackRouter::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn first_success_wins_and_failure_blacklists() {
        let a = MockProvider::failing("a", 0);
        let b = MockProvider::ok("b", 1, 42.0);
        let c = MockProvider::ok("c", 2, 99.0);
        let router = router_with(&[a.clone(), b.clone(), c.clone()], RoutingTable::new());

        let ticker = router
            .ticker_with("BTCUSDT", &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(ticker.price, 42.0);
        assert_eq!(a.calls(), 1);
        assert_eq!(c.calls(), 0, "first success must stop the loop");
        assert!(!router.registry().availability().is_available("a"));

        // Within the TTL window the failed provider is skipped without being invoked.
        let ticker = router
            .ticker_with("BTCUSDT", &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(ticker.price, 42.0);
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn routing_rule_order_overrides_priority() {
        let a = MockProvider::ok("a", 0, 1.0);
        let b = MockProvider::ok("b", 1, 2.0);
        let c = MockProvider::ok("c", 2, 3.0);
        let mut routing = RoutingTable::new();
        routing.insert(CoinRoutingRule {
            symbol: "XMRUSDT".into(),
            primary: "b".into(),
            fallback: vec!["c".into()],
        });
        let router = router_with(&[a.clone(), b.clone(), c.clone()], routing);

        let ticker = router
            .ticker_with("XMRUSDT", &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(ticker.price, 2.0, "rule primary must be tried first");
        assert_eq!(a.calls(), 0, "providers outside the rule are never tried");
    }

    #[tokio::test]
    async fn routing_rule_falls_back_in_rule_order() {
        let b = MockProvider::failing("b", 1);
        let c = MockProvider::ok("c", 2, 3.0);
        let mut routing = RoutingTable::new();
        routing.insert(CoinRoutingRule {
            symbol: "XMRUSDT".into(),
            primary: "b".into(),
            fallback: vec!["c".into()],
        });
        let router = router_with(&[b.clone(), c.clone()], routing);

        let ticker = router
            .ticker_with("XMRUSDT", &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(ticker.price, 3.0);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn forced_provider_is_the_only_candidate() {
        let a = MockProvider::ok("a", 0, 1.0);
        let b = MockProvider::failing("b", 1);
        let router = router_with(&[a.clone(), b.clone()], RoutingTable::new());

        let err = router
            .ticker_with("BTCUSDT", &FetchOptions::forced("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AllProvidersExhausted { .. }));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn exhaustion_aggregates_every_attempt() {
        let a = MockProvider::failing("a", 0);
        let b = MockProvider::failing("b", 1);
        let router = router_with(&[a, b], RoutingTable::new());

        let err = router
            .ticker_with("BTCUSDT", &FetchOptions::default())
            .await
            .unwrap_err();
        match err {
            Error::AllProvidersExhausted { symbol, attempts } => {
                assert_eq!(symbol, "BTCUSDT");
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].provider, "a");
                assert_eq!(attempts[1].provider, "b");
                assert!(attempts[0].message.contains("HTTP 502"));
            }
            other => panic!("expected AllProvidersExhausted, got: {other}"),
        }
    }

    #[tokio::test]
    async fn interval_filter_skips_without_invoking() {
        let hourly_only: HashSet<String> = ["1h".to_string()].into_iter().collect();
        let a = MockProvider::build("a", 0, 1.0, None, hourly_only, 1000);
        let b = MockProvider::ok("b", 1, 2.0);
        let router = router_with(&[a.clone(), b.clone()], RoutingTable::new());

        let candles = router
            .historical_with("BTCUSDT", "5m", 50, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(a.calls(), 0, "interval-incapable provider must not be dispatched");
        assert_eq!(candles[0].close, 2.0);
    }

    #[tokio::test]
    async fn limit_is_clamped_to_provider_maximum() {
        let a = MockProvider::build("a", 0, 1.0, None, HashSet::new(), 500);
        let router = router_with(&[a.clone()], RoutingTable::new());

        router
            .historical_with("BTCUSDT", "1h", 1000, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(*a.seen_limit.lock().unwrap(), Some(500));
    }

    #[tokio::test]
    async fn capability_mismatch_does_not_blacklist() {
        let a = MockProvider::build(
            "a",
            0,
            0.0,
            Some(|code| Error::SymbolUnsupported {
                provider: code.into(),
                symbol: "OBSCUREUSDT".into(),
            }),
            HashSet::new(),
            1000,
        );
        let b = MockProvider::ok("b", 1, 7.0);
        let router = router_with(&[a.clone(), b], RoutingTable::new());

        let ticker = router
            .ticker_with("OBSCUREUSDT", &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(ticker.price, 7.0);
        assert!(
            router.registry().availability().is_available("a"),
            "capability mismatch must not penalize availability"
        );
    }

    #[tokio::test]
    async fn expired_deadline_aborts_without_dispatch() {
        let a = MockProvider::ok("a", 0, 1.0);
        let router = router_with(&[a.clone()], RoutingTable::new());

        let past = Instant::now()
            .checked_sub(Duration::from_secs(1))
            .expect("clock near epoch");
        let err = router
            .ticker_with("BTCUSDT", &FetchOptions::with_deadline(past))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AllProvidersExhausted { .. }));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn lowest_priority_provider_serves_untouched_history() {
        // Priorities [2, 0, 1]: the priority-0 provider must be the only one called.
        let slow = MockProvider::ok("slow", 2, 5.0);
        let fast = MockProvider::ok("fast", 0, 10.0);
        let mid = MockProvider::ok("mid", 1, 7.0);
        let router = router_with(&[slow.clone(), fast.clone(), mid.clone()], RoutingTable::new());

        let candles = router
            .historical_with("BTCUSDT", "1h", 100, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(candles.len(), 100);
        assert!(candles.iter().all(|c| c.close == 10.0));
        assert!(candles.windows(2).all(|w| w[0].open_time < w[1].open_time));
        assert_eq!(fast.calls(), 1);
        assert_eq!(mid.calls(), 0);
        assert_eq!(slow.calls(), 0);
    }

    #[tokio::test]
    async fn multi_ticker_uses_priority_order() {
        let a = MockProvider::failing("a", 0);
        let b = MockProvider::ok("b", 1, 3.0);
        let router = router_with(&[a, b], RoutingTable::new());

        let symbols = vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()];
        let tickers = router
            .tickers_with(&symbols, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(tickers.len(), 2);
        assert!(tickers.iter().all(|t| t.price == 3.0));
    }
}
