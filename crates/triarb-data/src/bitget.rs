//! Bitget spot market REST client.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use triarb_core::error::DataError;
use triarb_core::traits::MarketData;
use triarb_core::types::{Bar, Pair, Timeframe};

use crate::rate_limit::RateLimiter;

/// Success code carried in every Bitget response envelope.
const SUCCESS_CODE: &str = "00000";

/// Bitget API configuration.
#[derive(Debug, Clone)]
pub struct BitgetConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Requests admitted per `rate_window`
    pub rate_limit: usize,
    pub rate_window: Duration,
}

impl Default for BitgetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bitget.com".to_string(),
            request_timeout: Duration::from_secs(10),
            rate_limit: 20,
            rate_window: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    symbol: String,
    last_pr: String,
}

/// Public-endpoint client; no credentials are needed for market data.
pub struct BitgetClient {
    config: BitgetConfig,
    client: Client,
    limiter: RateLimiter,
}

impl BitgetClient {
    /// Create a new client.
    pub fn new(config: BitgetConfig) -> Result<Self, DataError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DataError::Connection(e.to_string()))?;

        let limiter = RateLimiter::new(config.rate_limit, config.rate_window, "bitget");

        Ok(Self {
            config,
            client,
            limiter,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DataError> {
        self.limiter.check()?;

        let url = self.url(path);
        debug!(url = %url, ?query, "bitget request");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DataError::Timeout(path.to_string(), self.config.request_timeout.as_millis() as u64)
                } else {
                    DataError::Connection(e.to_string())
                }
            })?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = resp
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(self.config.rate_window.as_millis() as u64);
            return Err(DataError::RateLimited { retry_after_ms });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| DataError::Connection(e.to_string()))?;

        if !status.is_success() {
            return Err(DataError::Api(format!("{}: {}", status, text)));
        }

        unwrap_envelope(&text)
    }
}

fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> Result<T, DataError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| DataError::Parse(e.to_string()))?;

    if envelope.code != SUCCESS_CODE {
        return Err(DataError::Api(format!("{}: {}", envelope.code, envelope.msg)));
    }

    envelope
        .data
        .ok_or_else(|| DataError::Parse("response has no data".into()))
}

fn parse_number(symbol: &str, field: &str, raw: &str) -> Result<f64, DataError> {
    raw.trim().parse::<f64>().map_err(|_| DataError::InvalidData {
        symbol: symbol.to_string(),
        reason: format!("{} '{}' is not a number", field, raw),
    })
}

fn ticker_price(pair: &Pair, tickers: Vec<Ticker>) -> Result<f64, DataError> {
    let symbol = pair.exchange_symbol();
    let ticker = tickers
        .into_iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(&symbol))
        .ok_or_else(|| DataError::SymbolNotFound(pair.to_string()))?;
    parse_number(&symbol, "lastPr", &ticker.last_pr)
}

/// Rows are `[ts, open, high, low, close, baseVolume, ...]`, all strings.
fn parse_candles(pair: &Pair, rows: Vec<Vec<String>>) -> Result<Vec<Bar>, DataError> {
    let symbol = pair.exchange_symbol();
    let mut bars = rows
        .iter()
        .map(|row| {
            if row.len() < 6 {
                return Err(DataError::InvalidData {
                    symbol: symbol.clone(),
                    reason: format!("candle has {} fields, expected at least 6", row.len()),
                });
            }
            let timestamp = row[0].trim().parse::<i64>().map_err(|_| DataError::InvalidData {
                symbol: symbol.clone(),
                reason: format!("timestamp '{}' is not an integer", row[0]),
            })?;
            Ok(Bar::new(
                timestamp,
                parse_number(&symbol, "open", &row[1])?,
                parse_number(&symbol, "high", &row[2])?,
                parse_number(&symbol, "low", &row[3])?,
                parse_number(&symbol, "close", &row[4])?,
                parse_number(&symbol, "volume", &row[5])?,
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

#[async_trait]
impl MarketData for BitgetClient {
    async fn last_price(&self, pair: &Pair) -> Result<f64, DataError> {
        let tickers: Vec<Ticker> = self
            .get(
                "/api/v2/spot/market/tickers",
                &[("symbol", pair.exchange_symbol())],
            )
            .await?;
        ticker_price(pair, tickers)
    }

    async fn recent_candles(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let rows: Vec<Vec<String>> = self
            .get(
                "/api/v2/spot/market/candles",
                &[
                    ("symbol", pair.exchange_symbol()),
                    ("granularity", timeframe.exchange_granularity().to_string()),
                    ("limit", count.to_string()),
                ],
            )
            .await?;
        parse_candles(pair, rows)
    }

    fn name(&self) -> &str {
        "bitget"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_envelope() {
        let body = r#"{
            "code": "00000",
            "msg": "success",
            "requestTime": 1695808949356,
            "data": [{
                "symbol": "XRPUSDT",
                "high24h": "0.52",
                "open": "0.49",
                "lastPr": "0.4851",
                "low24h": "0.48",
                "baseVolume": "1000",
                "ts": "1695808949356"
            }]
        }"#;
        let tickers: Vec<Ticker> = unwrap_envelope(body).unwrap();
        let price = ticker_price(&Pair::new("XRP", "USDT"), tickers).unwrap();
        assert!((price - 0.4851).abs() < 1e-12);
    }

    #[test]
    fn test_error_code_is_api_error() {
        let body = r#"{"code": "40034", "msg": "Parameter does not exist", "data": null}"#;
        let err = unwrap_envelope::<Vec<Ticker>>(body).unwrap_err();
        assert_eq!(err, DataError::Api("40034: Parameter does not exist".into()));
    }

    #[test]
    fn test_missing_symbol() {
        let body = r#"{"code": "00000", "msg": "success", "data": []}"#;
        let tickers: Vec<Ticker> = unwrap_envelope(body).unwrap();
        assert!(matches!(
            ticker_price(&Pair::new("XRP", "BTC"), tickers),
            Err(DataError::SymbolNotFound(_))
        ));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            unwrap_envelope::<Vec<Ticker>>("<html>bad gateway</html>"),
            Err(DataError::Parse(_))
        ));
    }

    #[test]
    fn test_candles_sorted_oldest_first() {
        let body = r#"{"code": "00000", "msg": "success", "data": [
            ["1700043200000", "0.51", "0.52", "0.50", "0.505", "900", "450", "450"],
            ["1700000000000", "0.50", "0.51", "0.49", "0.50", "1000", "500", "500"]
        ]}"#;
        let rows: Vec<Vec<String>> = unwrap_envelope(body).unwrap();
        let bars = parse_candles(&Pair::new("XRP", "USDT"), rows).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1700000000000);
        assert_eq!(bars[1].close, 0.505);
    }

    #[test]
    fn test_short_candle_row_rejected() {
        let rows = vec![vec!["1700000000000".to_string(), "0.5".to_string()]];
        assert!(matches!(
            parse_candles(&Pair::new("XRP", "USDT"), rows),
            Err(DataError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_url_join() {
        let client = BitgetClient::new(BitgetConfig {
            base_url: "https://api.bitget.com/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.url("/api/v2/spot/market/tickers"),
            "https://api.bitget.com/api/v2/spot/market/tickers"
        );
        assert_eq!(client.name(), "bitget");
    }
}
