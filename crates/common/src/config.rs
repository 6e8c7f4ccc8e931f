/// All configuration consumed by the core, loaded from environment variables
/// at startup. Every value has a default; the market-data endpoints are
/// public and need no credentials.
#[derive(Debug, Clone)]
pub struct Config {
    // Provider endpoints
    pub binance_base_url: String,
    pub indodax_base_url: String,

    // Networking
    pub request_timeout_secs: u64,

    // Availability blacklist TTL applied when a provider call fails.
    pub availability_ttl_secs: u64,

    // Optional coin -> provider routing table (TOML file).
    pub routing_path: Option<String>,

    // Fee schedule, percentages of the traded amount (tax is on the fee).
    pub fee_maker_pct: f64,
    pub fee_taker_pct: f64,
    pub fee_levy_pct: f64,
    pub fee_tax_pct: f64,
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first
    /// if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            binance_base_url: optional_env("BINANCE_BASE_URL")
                .unwrap_or_else(|| "https://api.binance.com".to_string()),
            indodax_base_url: optional_env("INDODAX_BASE_URL")
                .unwrap_or_else(|| "https://indodax.com".to_string()),
            request_timeout_secs: parsed_env("REQUEST_TIMEOUT_SECS", 15),
            availability_ttl_secs: parsed_env("AVAILABILITY_TTL_SECS", 300),
            routing_path: optional_env("COIN_ROUTING_PATH"),
            fee_maker_pct: parsed_env("FEE_MAKER_PCT", 0.10),
            fee_taker_pct: parsed_env("FEE_TAKER_PCT", 0.15),
            fee_levy_pct: parsed_env("FEE_LEVY_PCT", 0.05),
            fee_tax_pct: parsed_env("FEE_TAX_PCT", 11.0),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    optional_env(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
