//! CLI command implementations.

pub mod check;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use triarb_config::AppConfig;
use triarb_core::traits::MarketData;
use triarb_data::{BitgetClient, CsvMarketData, GuardedMarketData};

/// Build the configured market data source behind timeout and validation.
pub(crate) fn build_market(
    config: &AppConfig,
    csv_override: Option<&Path>,
) -> Result<Arc<dyn MarketData>> {
    let timeout = config.fetch_timeout();
    let csv_dir = csv_override
        .map(Path::to_path_buf)
        .or_else(|| config.exchange.csv_dir.as_ref().map(PathBuf::from));

    let market: Arc<dyn MarketData> = match csv_dir {
        Some(dir) => {
            let source = CsvMarketData::new(&dir)
                .with_context(|| format!("failed to open CSV directory {}", dir.display()))?;
            info!(dir = %dir.display(), "replaying CSV market data");
            Arc::new(GuardedMarketData::new(source, timeout))
        }
        None => {
            let client = BitgetClient::new(config.bitget_config())
                .context("failed to build Bitget client")?;
            info!(base_url = %config.exchange.base_url, "using Bitget market data");
            Arc::new(GuardedMarketData::new(client, timeout))
        }
    };
    Ok(market)
}
