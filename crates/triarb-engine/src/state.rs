//! The monitor's mutable state.

use chrono::Utc;
use std::collections::VecDeque;
use triarb_broker::TradeOutcome;
use triarb_core::types::{
    IndicatorSnapshot, MarketSnapshot, OpportunityRecord, Pair, Portfolio, Route, SessionStats,
    StateSnapshot,
};

/// Everything one cycle reads and writes.
///
/// Owned by the scheduler; nothing else holds a reference across cycles.
/// Subscribers only ever see the immutable [`StateSnapshot`] taken at the end
/// of a cycle.
#[derive(Debug, Clone)]
pub struct BotState {
    route: Route,
    prices: MarketSnapshot,
    moving_averages: IndicatorSnapshot,
    portfolio: Portfolio,
    last_trade_log: Vec<String>,
    opportunity_detected: bool,
    recent_opportunities: VecDeque<OpportunityRecord>,
    history_len: usize,
    stats: SessionStats,
    cycle: u64,
}

impl BotState {
    /// Fresh state: every price and average absent, portfolio at its seed.
    pub fn new(route: Route, portfolio: Portfolio, history_len: usize) -> Self {
        let prices = MarketSnapshot::tracking(route.pairs());
        let moving_averages = IndicatorSnapshot::tracking(route.baseline_pairs());
        Self {
            route,
            prices,
            moving_averages,
            portfolio,
            last_trade_log: Vec::new(),
            opportunity_detected: false,
            recent_opportunities: VecDeque::with_capacity(history_len),
            history_len,
            stats: SessionStats::default(),
            cycle: 0,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn prices(&self) -> &MarketSnapshot {
        &self.prices
    }

    pub fn moving_averages(&self) -> &IndicatorSnapshot {
        &self.moving_averages
    }

    pub fn portfolio_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Advance the cycle counter.
    pub fn begin_cycle(&mut self) -> u64 {
        self.cycle += 1;
        self.cycle
    }

    pub fn record_price(&mut self, pair: &Pair, price: f64) {
        self.prices.set(pair, price);
    }

    pub fn record_average(&mut self, pair: &Pair, value: Option<f64>) {
        self.moving_averages.set(pair, value);
    }

    pub fn set_opportunity(&mut self, detected: bool) {
        self.opportunity_detected = detected;
    }

    /// Replace the trade log and update session totals.
    pub fn record_trade(&mut self, outcome: TradeOutcome) {
        self.stats.trades_attempted += 1;
        match outcome.pnl {
            Some(pnl) if outcome.is_complete() => {
                self.stats.trades_completed += 1;
                self.stats.cumulative_pnl += pnl;
            }
            _ => self.stats.trades_aborted += 1,
        }
        self.last_trade_log = outcome.log;
    }

    /// Add to the bounded, most-recent-first opportunity history.
    pub fn record_opportunity(&mut self, record: OpportunityRecord) {
        if self.history_len == 0 {
            return;
        }
        self.recent_opportunities.push_front(record);
        self.recent_opportunities.truncate(self.history_len);
    }

    /// Immutable copy of the current state for publication.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            cycle: self.cycle,
            timestamp: Utc::now(),
            prices: self.prices.clone(),
            moving_averages: self.moving_averages.clone(),
            portfolio: self.portfolio.clone(),
            last_trade_log: self.last_trade_log.clone(),
            opportunity_detected: self.opportunity_detected,
            recent_opportunities: self.recent_opportunities.iter().cloned().collect(),
            stats: self.stats.clone(),
        }
    }
}
