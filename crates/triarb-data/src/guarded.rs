//! Timeout and validation at the market data boundary.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use triarb_core::error::DataError;
use triarb_core::traits::MarketData;
use triarb_core::types::{Bar, Pair, Timeframe};

/// Wraps any source so that a call either returns usable values or fails.
///
/// Prices must be finite and positive. A candle series is rejected whole if
/// any close is unusable, and is always returned oldest first.
pub struct GuardedMarketData<M> {
    inner: M,
    timeout: Duration,
}

impl<M: MarketData> GuardedMarketData<M> {
    pub fn new(inner: M, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn timed_out(&self, pair: &Pair) -> DataError {
        DataError::Timeout(pair.to_string(), self.timeout.as_millis() as u64)
    }
}

#[async_trait]
impl<M: MarketData> MarketData for GuardedMarketData<M> {
    async fn last_price(&self, pair: &Pair) -> Result<f64, DataError> {
        let price = timeout(self.timeout, self.inner.last_price(pair))
            .await
            .map_err(|_| self.timed_out(pair))??;

        if !price.is_finite() || price <= 0.0 {
            return Err(DataError::InvalidData {
                symbol: pair.to_string(),
                reason: format!("price {} is not a positive number", price),
            });
        }
        Ok(price)
    }

    async fn recent_candles(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let mut bars = timeout(self.timeout, self.inner.recent_candles(pair, timeframe, count))
            .await
            .map_err(|_| self.timed_out(pair))??;

        if let Some(bad) = bars.iter().find(|b| !b.has_valid_close()) {
            return Err(DataError::InvalidData {
                symbol: pair.to_string(),
                reason: format!("candle at {} has close {}", bad.timestamp, bad.close),
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
