//! Cycle scheduler: fetch, detect, execute, publish, sleep.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use triarb_broker::{PaperTrader, SimulatorConfig, TradeOutcome};
use triarb_core::traits::MarketData;
use triarb_core::types::{Bar, OpportunityRecord, Route, StateSnapshot, Timeframe};
use triarb_core::Shutdown;
use triarb_indicators::baseline;
use triarb_monitor::{PublishReport, SubscriberRegistry};
use triarb_strategy::{detect, LegReading, Opportunity, OpportunityConfig};

use crate::state::BotState;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between cycle starts
    pub cycle_interval: Duration,
    /// Closes averaged for the baseline
    pub ma_window: usize,
    /// Candle granularity for the baseline
    pub timeframe: Timeframe,
    /// Detected opportunities kept in the snapshot
    pub history_len: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(30),
            ma_window: 20,
            timeframe: Timeframe::Hour12,
            history_len: 5,
        }
    }
}

/// What one cycle did.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub snapshot: StateSnapshot,
    pub opportunity: Opportunity,
    pub trade: Option<TradeOutcome>,
    pub publish: PublishReport,
}

/// Drives the decision loop.
///
/// Cycles never overlap: a cycle, including any simulated trade and its
/// pacing delays, finishes before the next fetch starts.
pub struct CycleScheduler {
    config: SchedulerConfig,
    detector: OpportunityConfig,
    trader: PaperTrader,
    market: Arc<dyn MarketData>,
    registry: Arc<SubscriberRegistry>,
    state: BotState,
}

impl CycleScheduler {
    pub fn new(
        config: SchedulerConfig,
        detector: OpportunityConfig,
        simulator: SimulatorConfig,
        market: Arc<dyn MarketData>,
        registry: Arc<SubscriberRegistry>,
        state: BotState,
    ) -> Self {
        Self {
            config,
            detector,
            trader: PaperTrader::new(simulator),
            market,
            registry,
            state,
        }
    }

    /// Run cycles until shutdown, then hand back the final state.
    pub async fn run(mut self, mut shutdown: Shutdown) -> BotState {
        info!(
            interval_ms = self.config.cycle_interval.as_millis() as u64,
            source = self.market.name(),
            "scheduler started"
        );

        let mut ticker = interval(self.config.cycle_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait() => break,
            }
            if shutdown.is_triggered() {
                break;
            }
            self.run_once(&mut shutdown).await;
        }

        info!(cycles = self.state.cycle(), "scheduler stopped");
        self.state
    }

    /// One full cycle.
    pub async fn run_once(&mut self, shutdown: &mut Shutdown) -> CycleReport {
        let cycle = self.state.begin_cycle();
        debug!(cycle, "cycle started");

        let route = self.state.route().clone();
        self.fetch(&route).await;

        let cheap = self.reading(&route, true);
        let rich = self.reading(&route, false);
        let opportunity = detect(&self.detector, cheap, rich);
        self.state.set_opportunity(opportunity.detected);
        info!(
            cycle,
            detected = opportunity.detected,
            rationale = %opportunity.rationale,
            "detection complete"
        );

        let trade = if opportunity.detected && !shutdown.is_triggered() {
            let prices = self.state.prices().clone();
            let outcome = self
                .trader
                .execute(
                    &route,
                    self.state.portfolio_mut(),
                    &prices,
                    self.market.as_ref(),
                    shutdown,
                )
                .await;
            self.state.record_trade(outcome.clone());
            Some(outcome)
        } else {
            None
        };

        if opportunity.detected {
            let executed = trade.as_ref().is_some_and(TradeOutcome::is_complete);
            if let Some(record) = opportunity_record(&route, cheap, rich, &opportunity, executed) {
                self.state.record_opportunity(record);
            }
        }

        let snapshot = self.state.snapshot();
        let publish = self.registry.publish(&snapshot);
        info!(
            cycle,
            delivered = publish.delivered,
            dropped = publish.dropped,
            "snapshot published"
        );

        CycleReport {
            snapshot,
            opportunity,
            trade,
            publish,
        }
    }

    /// Refresh prices and baselines. A failed fetch keeps that pair's
    /// previous value and does not stop the others.
    async fn fetch(&mut self, route: &Route) {
        for pair in route.pairs() {
            match self.market.last_price(pair).await {
                Ok(price) => self.state.record_price(pair, price),
                Err(e) => warn!(pair = %pair, error = %e, "price fetch failed, keeping previous value"),
            }
        }

        for pair in route.baseline_pairs() {
            match self
                .market
                .recent_candles(pair, self.config.timeframe, self.config.ma_window)
                .await
            {
                Ok(bars) => {
                    let ma = match baseline(&Bar::closes(&bars), self.config.ma_window) {
                        Ok(value) => Some(value),
                        Err(e) => {
                            debug!(pair = %pair, candles = bars.len(), reason = %e, "average unavailable");
                            None
                        }
                    };
                    self.state.record_average(pair, ma);
                }
                Err(e) => warn!(pair = %pair, error = %e, "candle fetch failed, keeping previous average"),
            }
        }
    }

    fn reading(&self, route: &Route, cheap: bool) -> LegReading {
        let pair = if cheap { route.cheap() } else { route.rich() };
        LegReading::new(
            self.state.prices().get(pair),
            self.state.moving_averages().get(pair),
        )
    }
}

fn opportunity_record(
    route: &Route,
    cheap: LegReading,
    rich: LegReading,
    opportunity: &Opportunity,
    executed: bool,
) -> Option<OpportunityRecord> {
    Some(OpportunityRecord {
        detected_at: Utc::now(),
        cheap_pair: route.cheap().to_string(),
        cheap_price: cheap.price?,
        cheap_ma: cheap.ma?,
        cheap_deviation_pct: opportunity.cheap_deviation_pct?,
        rich_pair: route.rich().to_string(),
        rich_price: rich.price?,
        rich_ma: rich.ma?,
        rich_deviation_pct: opportunity.rich_deviation_pct?,
        executed,
    })
}
