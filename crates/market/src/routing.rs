use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Per-symbol provider routing override.
///
/// When a symbol has a rule, the fallback router tries `primary` first and
/// then `fallback` in order, ignoring global priorities. Symbols without a
/// rule use all registered providers sorted by ascending priority.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoinRoutingRule {
    pub symbol: String,
    pub primary: String,
    #[serde(default)]
    pub fallback: Vec<String>,
}

impl CoinRoutingRule {
    /// Full candidate order: primary first, then fallbacks, deduplicated.
    pub fn candidate_order(&self) -> Vec<String> {
        let mut order = vec![self.primary.clone()];
        for code in &self.fallback {
            if !order.contains(code) {
                order.push(code.clone());
            }
        }
        order
    }
}

/// On-disk shape of the routing table.
///
/// Example `config/routing.toml`:
/// ```toml
/// [[route]]
/// symbol = "BTCIDR"
/// primary = "indodax"
/// fallback = ["binance"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutingFileConfig {
    #[serde(rename = "route", default)]
    pub routes: Vec<CoinRoutingRule>,
}

/// Routing rules keyed by symbol.
#[derive(Debug, Default)]
pub struct RoutingTable {
    rules: HashMap<String, CoinRoutingRule>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<CoinRoutingRule>) -> Self {
        let mut table = Self::new();
        for rule in rules {
            table.insert(rule);
        }
        table
    }

    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read routing table '{path}': {e}")))?;
        let file: RoutingFileConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse routing table '{path}': {e}")))?;
        Ok(Self::from_rules(file.routes))
    }

    /// Later rules for the same symbol replace earlier ones.
    pub fn insert(&mut self, rule: CoinRoutingRule) {
        self.rules.insert(rule.symbol.clone(), rule);
    }

    pub fn rule_for(&self, symbol: &str) -> Option<&CoinRoutingRule> {
        self.rules.get(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
