//! Run the monitor.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use triarb_config::AppConfig;
use triarb_core::Shutdown;
use triarb_engine::{BotState, CycleScheduler};
use triarb_monitor::{SubscriberRegistry, WsServer};

use super::build_market;
use super::check::probe;
use crate::cli::RunArgs;

pub async fn run(args: RunArgs, config: AppConfig) -> Result<()> {
    let route = config.route()?;
    info!(
        cheap = %route.cheap(),
        rich = %route.rich(),
        cross = %route.cross(),
        "starting monitor"
    );

    let market = build_market(&config, args.csv_dir.as_deref())?;

    let reachable = probe(market.as_ref(), &route)
        .await
        .into_iter()
        .filter(|(pair, result)| match result {
            Ok(_) => true,
            Err(e) => {
                warn!(pair = %pair, error = %e, "startup price check failed");
                false
            }
        })
        .count();
    if reachable == 0 {
        bail!("market data source {} unreachable for every route pair", market.name());
    }

    let scheduler_config = config.scheduler_config();
    let state = BotState::new(
        route,
        config.starting_portfolio(),
        scheduler_config.history_len,
    );
    let registry = Arc::new(SubscriberRegistry::new());
    let mut scheduler = CycleScheduler::new(
        scheduler_config,
        config.opportunity_config(),
        config.simulator_config(),
        Arc::clone(&market),
        Arc::clone(&registry),
        state,
    );

    if args.once {
        let report = scheduler.run_once(&mut Shutdown::never()).await;
        println!("{}", report.snapshot.to_json()?);
        return Ok(());
    }

    let addr = config.server.addr();
    let server = WsServer::bind(&addr, Arc::clone(&registry), config.server.buffer)
        .await
        .with_context(|| format!("failed to bind subscriber listener on {}", addr))?;

    let (trigger, shutdown) = Shutdown::channel();
    let server_task = tokio::spawn(server.run(shutdown.clone()));
    let scheduler_task = tokio::spawn(scheduler.run(shutdown));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => warn!(error = %e, "failed to listen for ctrl-c, shutting down"),
    }
    trigger.trigger();

    let state = scheduler_task.await.context("scheduler task failed")?;
    server_task.await.context("listener task failed")?;
    // Listener is closed; the market data source goes last
    drop(market);

    let stats = state.stats();
    info!(
        cycles = state.cycle(),
        trades_completed = stats.trades_completed,
        trades_aborted = stats.trades_aborted,
        cumulative_pnl = %stats.cumulative_pnl,
        "monitor stopped"
    );
    Ok(())
}
