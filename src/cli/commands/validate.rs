//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use triarb_config::{AppConfig, ConfigError};

use crate::cli::ValidateArgs;

pub async fn run(
    args: ValidateArgs,
    config_path: &Path,
    loaded: Result<AppConfig, ConfigError>,
) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    let route = config.route()?;
    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!(
        "Route: {} -> {} -> {} -> {}",
        route.quote_asset(),
        route.first_asset(),
        route.second_asset(),
        route.quote_asset()
    );
    println!(
        "Signal: {} below / {} above a {}-candle {} average",
        pct(config.strategy.depression_threshold),
        pct(config.strategy.elevation_threshold),
        config.strategy.ma_window,
        config.strategy.timeframe
    );
    println!(
        "Trade: {} {} notional, fee {}, {} ms between legs",
        config.trade.notional,
        route.quote_asset(),
        config.trade.fee_rate,
        config.trade.leg_delay_ms
    );
    println!("Cycle interval: {} ms", config.schedule.cycle_interval_ms);
    println!("Subscribers: ws://{}", config.server.addr());

    if args.print {
        println!();
        println!("{}", config.to_toml()?);
    }

    Ok(())
}

fn pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}
