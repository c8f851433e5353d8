//! OHLCV (Open, High, Low, Close, Volume) candles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single candle as returned by the market data port.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Whether the close is usable for indicator arithmetic.
    #[inline]
    pub fn has_valid_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }

    /// Get the timestamp as a DateTime, if it is in range.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Extract close prices from an ordered slice of bars.
    pub fn closes(bars: &[Bar]) -> Vec<f64> {
        bars.iter().map(|b| b.close).collect()
    }
}
