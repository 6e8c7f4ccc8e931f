use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, DataFeed};
use market::{FallbackRouter, ProviderRegistry};
use strategy::{FeeSchedule, StrategyRegistry};

/// Usage: `marketscout [SYMBOL] [STRATEGY] [INTERVAL] [AMOUNT]`
///
/// Runs one analysis and prints the canonical result as JSON. Scheduling and
/// notification delivery live outside this binary.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();

    let mut args = std::env::args().skip(1);
    let symbol = args.next().unwrap_or_else(|| "BTCUSDT".to_string());
    let strategy_code = args.next().unwrap_or_else(|| "rsi-reversal".to_string());
    let interval = args.next().unwrap_or_else(|| "1h".to_string());
    let amount: f64 = args.next().and_then(|v| v.parse().ok()).unwrap_or(1_000.0);

    // ── Providers ─────────────────────────────────────────────────────────────
    let registry = Arc::new(ProviderRegistry::from_config(&cfg));
    for status in registry.status_report() {
        info!(
            provider = %status.code,
            priority = status.priority,
            available = status.available,
            "provider configured"
        );
    }

    // ── Router + strategies ───────────────────────────────────────────────────
    let feed: Arc<dyn DataFeed> = Arc::new(FallbackRouter::new(registry));
    let strategies = StrategyRegistry::new(feed, FeeSchedule::from_config(&cfg));

    let strat = strategies.create(&strategy_code);
    info!(strategy = strat.code(), %symbol, %interval, amount, "running analysis");

    let result = strat.analyze(&symbol, amount, &interval).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
