use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use common::{Config, MarketDataProvider, RateLimitInfo};

use crate::adapters::{BinanceAdapter, IndodaxAdapter};
use crate::availability::AvailabilityMap;
use crate::routing::RoutingTable;

/// Holds every configured provider adapter, sorted ascending by priority,
/// together with the availability blacklist and the coin routing table.
///
/// Built once at process start and passed by reference; registration is
/// idempotent by adapter code.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn MarketDataProvider>>,
    availability: AvailabilityMap,
    routing: RoutingTable,
    availability_ttl: Duration,
}

impl ProviderRegistry {
    pub const DEFAULT_AVAILABILITY_TTL: Duration = Duration::from_secs(300);

    pub fn new(routing: RoutingTable) -> Self {
        Self {
            providers: Vec::new(),
            availability: AvailabilityMap::new(),
            routing,
            availability_ttl: Self::DEFAULT_AVAILABILITY_TTL,
        }
    }

    /// Build the registry from config. Each adapter is constructed inside a
    /// guarded call: a failing constructor is logged and skipped so one bad
    /// adapter never aborts initialization.
    pub fn from_config(cfg: &Config) -> Self {
        let routing = match &cfg.routing_path {
            Some(path) => match RoutingTable::load(path) {
                Ok(table) => table,
                Err(e) => {
                    warn!(error = %e, "failed to load coin routing table — using priority order");
                    RoutingTable::new()
                }
            },
            None => RoutingTable::new(),
        };

        let mut registry = Self::new(routing);
        registry.availability_ttl = Duration::from_secs(cfg.availability_ttl_secs);
        let timeout = Duration::from_secs(cfg.request_timeout_secs);

        match BinanceAdapter::new(&cfg.binance_base_url, timeout) {
            Ok(adapter) => registry.register(Arc::new(adapter)),
            Err(e) => warn!(provider = BinanceAdapter::CODE, error = %e, "adapter construction failed — skipping"),
        }
        match IndodaxAdapter::new(&cfg.indodax_base_url, timeout) {
            Ok(adapter) => registry.register(Arc::new(adapter)),
            Err(e) => warn!(provider = IndodaxAdapter::CODE, error = %e, "adapter construction failed — skipping"),
        }

        info!(providers = registry.providers.len(), "provider registry ready");
        registry
    }

    /// Register an adapter. A later registration with the same code replaces
    /// the earlier one; the priority ordering is maintained.
    pub fn register(&mut self, adapter: Arc<dyn MarketDataProvider>) {
        let code = adapter.descriptor().code.clone();
        self.providers.retain(|p| p.descriptor().code != code);
        self.providers.push(adapter);
        self.providers.sort_by_key(|p| p.descriptor().priority);
        info!(provider = %code, "provider registered");
    }

    /// All adapters, ascending by priority.
    pub fn list_by_priority(&self) -> Vec<Arc<dyn MarketDataProvider>> {
        self.providers.clone()
    }

    pub fn get(&self, code: &str) -> Option<Arc<dyn MarketDataProvider>> {
        self.providers
            .iter()
            .find(|p| p.descriptor().code == code)
            .cloned()
    }

    pub fn availability(&self) -> &AvailabilityMap {
        &self.availability
    }

    pub fn availability_ttl(&self) -> Duration {
        self.availability_ttl
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// Aggregated availability and rate-limit view for observability.
    pub fn status_report(&self) -> Vec<ProviderStatus> {
        self.providers
            .iter()
            .map(|p| {
                let desc = p.descriptor();
                ProviderStatus {
                    code: desc.code.clone(),
                    display_name: desc.display_name.clone(),
                    priority: desc.priority,
                    available: self.availability.is_available(&desc.code),
                    blacklist_remaining_secs: self
                        .availability
                        .remaining(&desc.code)
                        .map(|d| d.as_secs()),
                    rate_limit: p.rate_limit(),
                }
            })
            .collect()
    }
}

/// Per-provider snapshot exposed by `status_report`.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub code: String,
    pub display_name: String,
    pub priority: i32,
    pub available: bool,
    pub blacklist_remaining_secs: Option<u64>,
    pub rate_limit: RateLimitInfo,
}
