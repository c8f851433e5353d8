//! Market data port.

use crate::error::DataError;
use crate::types::{Bar, Pair, Timeframe};
use async_trait::async_trait;
use std::sync::Arc;

/// Capability interface to the trading venue's public market data.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch the last traded price of a pair.
    async fn last_price(&self, pair: &Pair) -> Result<f64, DataError>;

    /// Fetch recent candles.
    ///
    /// # Arguments
    /// * `pair` - The pair to fetch
    /// * `timeframe` - The candle granularity
    /// * `count` - Maximum number of candles to return
    ///
    /// # Returns
    /// Candles ordered from oldest to newest
    async fn recent_candles(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}

#[async_trait]
impl<M: MarketData + ?Sized> MarketData for Arc<M> {
    async fn last_price(&self, pair: &Pair) -> Result<f64, DataError> {
        (**self).last_price(pair).await
    }

    async fn recent_candles(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        (**self).recent_candles(pair, timeframe, count).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
