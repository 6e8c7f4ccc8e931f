use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{
    normalize_candles, Candle, DataFormat, Error, MarketDataProvider, ProviderDescriptor,
    RateLimitInfo, Result, SymbolInfo, Ticker,
};

use super::interval::interval_ms;
use super::RequestCounter;

/// Adapter for the Indodax public REST API.
///
/// Indodax serves a restricted interval set and at most 500 candles per
/// history request, so this adapter exercises the router's interval filtering
/// and limit clamping. Pairs are quoted in IDR or USDT.
pub struct IndodaxAdapter {
    descriptor: ProviderDescriptor,
    base_url: String,
    http: Client,
    counter: RequestCounter,
}

impl IndodaxAdapter {
    pub const CODE: &'static str = "indodax";

    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let supported_intervals: HashSet<String> = ["15m", "30m", "1h", "4h", "1d"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        Ok(Self {
            descriptor: ProviderDescriptor {
                code: Self::CODE.into(),
                display_name: "Indodax".into(),
                priority: 1,
                supported_intervals,
                max_history_limit: 500,
            },
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            counter: RequestCounter::new(180),
        })
    }

    /// Canonical interval token -> Indodax tradingview timeframe.
    fn native_timeframe(interval: &str) -> Result<&'static str> {
        let tf = match interval {
            "15m" => "15",
            "30m" => "30",
            "1h" => "60",
            "4h" => "240",
            "1d" => "1D",
            _ => {
                return Err(Error::IntervalUnsupported {
                    provider: Self::CODE.into(),
                    interval: interval.into(),
                })
            }
        };
        Ok(tf)
    }

    /// Canonical symbol (e.g. "BTCIDR") -> Indodax pair id (e.g. "btc_idr").
    fn pair_id(symbol: &str) -> Result<String> {
        for quote in ["IDR", "USDT"] {
            if let Some(base) = symbol.strip_suffix(quote) {
                if !base.is_empty() {
                    return Ok(format!(
                        "{}_{}",
                        base.to_lowercase(),
                        quote.to_lowercase()
                    ));
                }
            }
        }
        Err(Error::SymbolUnsupported {
            provider: Self::CODE.into(),
            symbol: symbol.into(),
        })
    }

    async fn get_text(&self, path_and_query: &str) -> Result<String> {
        self.counter.record();
        let url = format!("{}{}", self.base_url, path_and_query);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::ProviderUnavailable {
                provider: Self::CODE.into(),
                reason: format!("HTTP {status}: {body}"),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketDataProvider for IndodaxAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn historical(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let tf = Self::native_timeframe(interval)?;
        let pair = Self::pair_id(symbol)?;
        let step_ms = interval_ms(interval).ok_or_else(|| Error::IntervalUnsupported {
            provider: Self::CODE.into(),
            interval: interval.into(),
        })?;

        // The endpoint is windowed by epoch seconds, so derive the window
        // from the requested candle count.
        let to = Utc::now().timestamp();
        let from = to - (limit as i64) * step_ms / 1000;
        debug!(symbol, interval, limit, "fetching Indodax history");
        let body = self
            .get_text(&format!(
                "/tradingview/history_v2?from={from}&to={to}&tf={tf}&symbol={pair}"
            ))
            .await?;

        let rows: Vec<IndodaxBar> = serde_json::from_str(&body)?;
        let candles = rows
            .into_iter()
            .map(|bar| bar.into_candle(step_ms))
            .collect::<Result<Vec<Candle>>>()?;
        normalize_candles(candles)
    }

    async fn ticker(&self, symbol: &str) -> Result<Ticker> {
        let pair = Self::pair_id(symbol)?;
        let body = self.get_text(&format!("/api/ticker/{pair}")).await?;
        let raw: TickerEnvelope = serde_json::from_str(&body)?;
        raw.ticker.into_ticker(symbol)
    }

    async fn tickers(&self, symbols: &[String]) -> Result<Vec<Ticker>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let body = self.get_text("/api/tickers").await?;
        let raw: TickersEnvelope = serde_json::from_str(&body)?;

        let mut out = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let pair = Self::pair_id(symbol)?;
            let entry = raw.tickers.get(&pair).ok_or_else(|| Error::SymbolUnsupported {
                provider: Self::CODE.into(),
                symbol: symbol.clone(),
            })?;
            out.push(entry.clone().into_ticker(symbol)?);
        }
        Ok(out)
    }

    async fn symbol_info(&self, symbol: Option<&str>) -> Result<Vec<SymbolInfo>> {
        let body = self.get_text("/api/pairs").await?;
        let raw: Vec<PairEntry> = serde_json::from_str(&body)?;

        let infos: Vec<SymbolInfo> = raw
            .into_iter()
            .map(PairEntry::into_info)
            .filter(|info| symbol.map_or(true, |s| info.symbol == s))
            .collect();

        if infos.is_empty() {
            return Err(Error::SymbolUnsupported {
                provider: Self::CODE.into(),
                symbol: symbol.unwrap_or("<all>").into(),
            });
        }
        Ok(infos)
    }

    fn rate_limit(&self) -> RateLimitInfo {
        self.counter.info()
    }

    fn data_format(&self) -> DataFormat {
        DataFormat::JsonObjects
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

/// One tradingview history bar. Timestamps arrive as epoch seconds.
#[derive(Debug, Clone, Deserialize)]
struct IndodaxBar {
    #[serde(rename = "Time")]
    time: i64,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume", default)]
    volume: f64,
}

impl IndodaxBar {
    fn into_candle(self, step_ms: i64) -> Result<Candle> {
        let open_time = self.time.checked_mul(1000).ok_or_else(|| {
            Error::InvalidNumericInput(format!("bar timestamp {} overflows", self.time))
        })?;
        // The source reports no quote volume; derive it from the close.
        Ok(Candle {
            open_time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            close_time: open_time + step_ms - 1,
            quote_volume: self.volume * self.close,
        })
    }
}

#[derive(Deserialize)]
struct TickerEnvelope {
    ticker: TickerEntry,
}

#[derive(Debug, Clone, Deserialize)]
struct TickerEntry {
    last: String,
    #[serde(default)]
    server_time: Option<i64>,
}

impl TickerEntry {
    fn into_ticker(self, symbol: &str) -> Result<Ticker> {
        let price = self
            .last
            .parse::<f64>()
            .map_err(|e| Error::InvalidNumericInput(format!("'{}': {e}", self.last)))?;
        let timestamp = self
            .server_time
            .map(|s| s * 1000)
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        Ticker {
            symbol: symbol.to_string(),
            price,
            timestamp,
        }
        .validated()
    }
}

#[derive(Deserialize)]
struct TickersEnvelope {
    tickers: HashMap<String, TickerEntry>,
}

#[derive(Deserialize)]
struct PairEntry {
    symbol: String,
    traded_currency: String,
    base_currency: String,
    #[serde(default)]
    is_maintenance: u8,
}

impl PairEntry {
    fn into_info(self) -> SymbolInfo {
        SymbolInfo {
            symbol: self.symbol,
            base_asset: self.traded_currency.to_uppercase(),
            quote_asset: self.base_currency.to_uppercase(),
            status: if self.is_maintenance == 0 {
                "TRADING".to_string()
            } else {
                "MAINTENANCE".to_string()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_id_splits_known_quotes() {
        assert_eq!(IndodaxAdapter::pair_id("BTCIDR").unwrap(), "btc_idr");
        assert_eq!(IndodaxAdapter::pair_id("ETHUSDT").unwrap(), "eth_usdt");
        assert!(IndodaxAdapter::pair_id("BTCEUR").is_err());
        assert!(IndodaxAdapter::pair_id("IDR").is_err());
    }

    #[test]
    fn timeframe_mapping_rejects_unsupported() {
        assert_eq!(IndodaxAdapter::native_timeframe("1h").unwrap(), "60");
        assert_eq!(IndodaxAdapter::native_timeframe("1d").unwrap(), "1D");
        assert!(matches!(
            IndodaxAdapter::native_timeframe("1m"),
            Err(Error::IntervalUnsupported { .. })
        ));
    }

    #[test]
    fn bar_converts_to_canonical_candle() {
        let bar = IndodaxBar {
            time: 1_700_000_000,
            open: 10.0,
            high: 12.0,
            low: 9.0,
            close: 11.0,
            volume: 3.0,
        };
        let candle = bar.into_candle(3_600_000).unwrap();
        assert_eq!(candle.open_time, 1_700_000_000_000);
        assert_eq!(candle.close_time, 1_700_000_000_000 + 3_600_000 - 1);
        assert!((candle.quote_volume - 33.0).abs() < 1e-9);
        assert!(candle.is_well_formed());
    }

    #[test]
    fn ticker_entry_parses_and_validates() {
        let entry = TickerEntry { last: "1050000000".into(), server_time: Some(1_700_000_000) };
        let ticker = entry.into_ticker("BTCIDR").unwrap();
        assert_eq!(ticker.timestamp, 1_700_000_000_000);
        assert!(ticker.price > 0.0);

        let entry = TickerEntry { last: "-5".into(), server_time: None };
        assert!(entry.into_ticker("BTCIDR").is_err());
    }

    #[test]
    fn descriptor_restricts_intervals_and_limit() {
        let adapter =
            IndodaxAdapter::new("https://indodax.com", Duration::from_secs(15)).unwrap();
        assert!(adapter.descriptor().supports_interval("1h"));
        assert!(!adapter.descriptor().supports_interval("1m"));
        assert_eq!(adapter.descriptor().clamp_limit(1000), 500);
    }
}
