use thiserror::Error;

/// One failed provider attempt recorded by the fallback router.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub provider: String,
    pub message: String,
}

fn summarize(attempts: &[ProviderFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.provider, a.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum Error {
    /// Source unreachable, rate-limited, or self-reporting down. Triggers a
    /// temporary blacklist in the availability map.
    #[error("Provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// Declared capability mismatch. Skipped without penalizing availability.
    #[error("Provider '{provider}' does not support interval '{interval}'")]
    IntervalUnsupported { provider: String, interval: String },

    #[error("Provider '{provider}' does not list symbol '{symbol}'")]
    SymbolUnsupported { provider: String, symbol: String },

    /// The data is valid, just too short for the strategy's minimum. Not
    /// retried against other providers.
    #[error("Insufficient history: required {required} candles, got {got}")]
    InsufficientHistory { required: usize, got: usize },

    #[error("All providers exhausted for '{symbol}': {}", summarize(.attempts))]
    AllProvidersExhausted {
        symbol: String,
        attempts: Vec<ProviderFailure>,
    },

    /// Zero/negative price or a malformed payload value. Treated identically
    /// to a provider failure.
    #[error("Invalid numeric input: {0}")]
    InvalidNumericInput(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_error_lists_every_attempt() {
        let err = Error::AllProvidersExhausted {
            symbol: "BTCUSDT".into(),
            attempts: vec![
                ProviderFailure { provider: "binance".into(), message: "HTTP 502".into() },
                ProviderFailure { provider: "indodax".into(), message: "timed out".into() },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("binance: HTTP 502"));
        assert!(text.contains("indodax: timed out"));
    }
}
