//! Connection check command.

use anyhow::{bail, Result};
use triarb_config::AppConfig;
use triarb_core::error::DataError;
use triarb_core::traits::MarketData;
use triarb_core::types::{Pair, Route};

use super::build_market;
use crate::cli::CheckArgs;

/// Fetch the last price of every route pair once.
pub(crate) async fn probe(
    market: &dyn MarketData,
    route: &Route,
) -> Vec<(Pair, Result<f64, DataError>)> {
    let mut results = Vec::with_capacity(3);
    for pair in route.pairs() {
        results.push((pair.clone(), market.last_price(pair).await));
    }
    results
}

pub async fn run(args: CheckArgs, config: AppConfig) -> Result<()> {
    let route = config.route()?;
    let market = build_market(&config, args.csv_dir.as_deref())?;

    println!("Checking {} market data", market.name());
    let results = probe(market.as_ref(), &route).await;

    let mut reachable = 0;
    for (pair, result) in &results {
        match result {
            Ok(price) => {
                reachable += 1;
                println!("  {:<10} ok      {}", pair.to_string(), price);
            }
            Err(e) => println!("  {:<10} FAILED  {}", pair.to_string(), e),
        }
    }

    if reachable == 0 {
        bail!("market data source unreachable for every route pair");
    }
    println!("{}/{} pairs reachable", reachable, results.len());
    Ok(())
}
