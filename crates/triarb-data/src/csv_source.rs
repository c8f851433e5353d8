//! CSV replay source for offline runs.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use triarb_core::error::DataError;
use triarb_core::traits::MarketData;
use triarb_core::types::{Bar, Pair, Timeframe};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Serves candles from one CSV file per pair, named after the exchange
/// symbol (`XRPUSDT.csv`). The last price of a pair is its latest close.
///
/// Files are read once and kept in memory.
pub struct CsvMarketData {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Vec<Bar>>>,
}

impl CsvMarketData {
    /// Create a source over a directory of CSV files.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, DataError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DataError::Connection(format!(
                "CSV directory {} does not exist",
                dir.display()
            )));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn bars(&self, pair: &Pair) -> Result<Vec<Bar>, DataError> {
        let symbol = pair.exchange_symbol();
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bars) = cache.get(&symbol) {
            return Ok(bars.clone());
        }

        let path = self.dir.join(format!("{}.csv", symbol));
        if !path.exists() {
            return Err(DataError::SymbolNotFound(pair.to_string()));
        }
        let bars = load_from_path(&path)?;
        debug!(pair = %pair, bars = bars.len(), "loaded CSV candles");
        cache.insert(symbol, bars.clone());
        Ok(bars)
    }
}

fn load_from_path(path: &Path) -> Result<Vec<Bar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| DataError::Parse(e.to_string()))?;

    let mut bars = Vec::new();
    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::Parse(e.to_string()))?;
        let timestamp = parse_timestamp(&record.date)?;
        bars.push(Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Parse the timestamp formats found in exported candle files.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    let date_str = date_str.trim();

    if let Ok(ts) = date_str.parse::<i64>() {
        // Assume milliseconds if > 10 digits
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt.and_utc().timestamp_millis());
    }

    Err(DataError::Parse(format!("Could not parse date: {}", date_str)))
}

#[async_trait]
impl MarketData for CsvMarketData {
    async fn last_price(&self, pair: &Pair) -> Result<f64, DataError> {
        self.bars(pair)?
            .last()
            .map(|b| b.close)
            .ok_or_else(|| DataError::NoDataAvailable(pair.to_string()))
    }

    async fn recent_candles(
        &self,
        pair: &Pair,
        _timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = self.bars(pair)?;
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    fn name(&self) -> &str {
        "csv"
    }
}
