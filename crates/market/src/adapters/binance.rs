use std::collections::HashSet;
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

use super::interval::CANONICAL_INTERVALS;
use super::RequestCounter;

/// Adapter for the Binance public REST API.
///
/// Serves every canonical interval (Binance's own tokens match them) and up
/// to 1000 candles per history request.
pub struct BinanceAdapter {
    descriptor: ProviderDescriptor,
    base_url: String,
    http: Client,
    counter: RequestCounter,
}

impl BinanceAdapter {
    pub const CODE: &'static str = "binance";

    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            descriptor: ProviderDescriptor {
                code: Self::CODE.into(),
                display_name: "Binance".into(),
                priority: 0,
                // Empty set: Binance serves every canonical interval.
                supported_intervals: HashSet::new(),
                max_history_limit: 1000,
            },
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            counter: RequestCounter::new(1200),
        })
    }

    fn check_interval(&self, interval: &str) -> Result<()> {
        if CANONICAL_INTERVALS.contains(&interval) {
            Ok(())
        } else {
            Err(Error::IntervalUnsupported {
                provider: Self::CODE.into(),
                interval: interval.into(),
            })
        }
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

        // 429/418 are Binance's rate-limit and auto-ban responses.
        if status.as_u16() == 429 || status.as_u16() == 418 {
            return Err(Error::ProviderUnavailable {
                provider: Self::CODE.into(),
                reason: format!("rate limited: HTTP {status}"),
            });
        }
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
impl MarketDataProvider for BinanceAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn historical(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        self.check_interval(interval)?;
        debug!(symbol, interval, limit, "fetching Binance klines");
        let body = self
            .get_text(&format!(
                "/api/v3/klines?symbol={symbol}&interval={interval}&limit={limit}"
            ))
            .await?;

        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(&body)?;
        let candles = rows
            .iter()
            .map(parse_kline_row)
            .collect::<Result<Vec<Candle>>>()?;
        normalize_candles(candles)
    }

    async fn ticker(&self, symbol: &str) -> Result<Ticker> {
        let body = self
            .get_text(&format!("/api/v3/ticker/price?symbol={symbol}"))
            .await?;
        let raw: PriceTicker = serde_json::from_str(&body)?;
        raw.into_ticker()
    }

    async fn tickers(&self, symbols: &[String]) -> Result<Vec<Ticker>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        // Binance takes the batch as a JSON array in the query string.
        let list = serde_json::to_string(symbols)?;
        self.counter.record();
        let resp = self
            .http
            .get(format!("{}/api/v3/ticker/price", self.base_url))
            .query(&[("symbols", list)])
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

        let raw: Vec<PriceTicker> = serde_json::from_str(&body)?;
        raw.into_iter().map(PriceTicker::into_ticker).collect()
    }

    async fn symbol_info(&self, symbol: Option<&str>) -> Result<Vec<SymbolInfo>> {
        let path = match symbol {
            Some(s) => format!("/api/v3/exchangeInfo?symbol={s}"),
            None => "/api/v3/exchangeInfo".to_string(),
        };
        let body = self.get_text(&path).await?;
        let raw: ExchangeInfo = serde_json::from_str(&body)?;
        if raw.symbols.is_empty() {
            return Err(Error::SymbolUnsupported {
                provider: Self::CODE.into(),
                symbol: symbol.unwrap_or("<all>").into(),
            });
        }
        Ok(raw.symbols.into_iter().map(SymbolEntry::into_info).collect())
    }

    async fn is_available(&self) -> bool {
        self.get_text("/api/v3/ping").await.is_ok()
    }

    fn rate_limit(&self) -> RateLimitInfo {
        self.counter.info()
    }

    fn data_format(&self) -> DataFormat {
        DataFormat::JsonArrays
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

/// One kline row is a positional array:
/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume, ...]`
/// with prices encoded as decimal strings.
fn parse_kline_row(row: &Vec<serde_json::Value>) -> Result<Candle> {
    if row.len() < 8 {
        return Err(Error::InvalidNumericInput(format!(
            "kline row has {} fields, expected at least 8",
            row.len()
        )));
    }
    Ok(Candle {
        open_time: field_i64(&row[0])?,
        open: field_f64(&row[1])?,
        high: field_f64(&row[2])?,
        low: field_f64(&row[3])?,
        close: field_f64(&row[4])?,
        volume: field_f64(&row[5])?,
        close_time: field_i64(&row[6])?,
        quote_volume: field_f64(&row[7])?,
    })
}

fn field_f64(v: &serde_json::Value) -> Result<f64> {
    match v {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| Error::InvalidNumericInput(format!("'{s}': {e}"))),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::InvalidNumericInput(format!("non-finite number {n}"))),
        other => Err(Error::InvalidNumericInput(format!(
            "expected numeric field, got {other}"
        ))),
    }
}

fn field_i64(v: &serde_json::Value) -> Result<i64> {
    v.as_i64()
        .ok_or_else(|| Error::InvalidNumericInput(format!("expected integer field, got {v}")))
}

#[derive(Deserialize)]
struct PriceTicker {
    symbol: String,
    price: String,
}

impl PriceTicker {
    fn into_ticker(self) -> Result<Ticker> {
        let price = self
            .price
            .parse::<f64>()
            .map_err(|e| Error::InvalidNumericInput(format!("'{}': {e}", self.price)))?;
        Ticker {
            symbol: self.symbol,
            price,
            timestamp: Utc::now().timestamp_millis(),
        }
        .validated()
    }
}

#[derive(Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolEntry {
    symbol: String,
    status: String,
    base_asset: String,
    quote_asset: String,
}

impl SymbolEntry {
    fn into_info(self) -> SymbolInfo {
        SymbolInfo {
            symbol: self.symbol,
            base_asset: self.base_asset,
            quote_asset: self.quote_asset,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kline_row_with_string_prices() {
        let row: Vec<serde_json::Value> = serde_json::from_str(
            r#"[1700000000000, "100.1", "101.5", "99.2", "100.9", "12.5",
                1700000059999, "1260.2", 42, "6.1", "615.0", "0"]"#,
        )
        .unwrap();
        let candle = parse_kline_row(&row).unwrap();
        assert_eq!(candle.open_time, 1_700_000_000_000);
        assert!((candle.close - 100.9).abs() < 1e-9);
        assert!((candle.quote_volume - 1260.2).abs() < 1e-9);
        assert!(candle.is_well_formed());
    }

    #[test]
    fn rejects_short_kline_row() {
        let row: Vec<serde_json::Value> = serde_json::from_str("[1700000000000]").unwrap();
        assert!(parse_kline_row(&row).is_err());
    }

    #[test]
    fn price_ticker_rejects_zero_price() {
        let raw = PriceTicker { symbol: "BTCUSDT".into(), price: "0".into() };
        assert!(raw.into_ticker().is_err());
    }

    #[test]
    fn descriptor_serves_all_intervals() {
        let adapter =
            BinanceAdapter::new("https://api.binance.com", Duration::from_secs(15)).unwrap();
        assert!(adapter.descriptor().supports_interval("1m"));
        assert!(adapter.descriptor().supports_interval("1w"));
        assert_eq!(adapter.descriptor().clamp_limit(5000), 1000);
    }
}
