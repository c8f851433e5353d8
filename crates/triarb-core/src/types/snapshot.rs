//! Market, indicator and published state snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Pair, Portfolio};
use crate::error::TriarbError;

/// Last traded price per tracked pair; `None` until a valid fetch lands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketSnapshot {
    prices: BTreeMap<String, Option<f64>>,
}

impl MarketSnapshot {
    /// Create a snapshot tracking the given pairs, all absent.
    pub fn tracking<'a>(pairs: impl IntoIterator<Item = &'a Pair>) -> Self {
        Self {
            prices: pairs.into_iter().map(|p| (p.to_string(), None)).collect(),
        }
    }

    /// Current price of a pair, if known.
    pub fn get(&self, pair: &Pair) -> Option<f64> {
        self.prices.get(&pair.to_string()).copied().flatten()
    }

    /// Record a freshly fetched price.
    pub fn set(&mut self, pair: &Pair, price: f64) {
        self.prices.insert(pair.to_string(), Some(price));
    }
}

/// Moving-average value per baseline pair; `None` while history is insufficient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSnapshot {
    averages: BTreeMap<String, Option<f64>>,
}

impl IndicatorSnapshot {
    /// Create a snapshot tracking the given pairs, all unavailable.
    pub fn tracking<'a>(pairs: impl IntoIterator<Item = &'a Pair>) -> Self {
        Self {
            averages: pairs.into_iter().map(|p| (p.to_string(), None)).collect(),
        }
    }

    /// Current moving average of a pair, if available.
    pub fn get(&self, pair: &Pair) -> Option<f64> {
        self.averages.get(&pair.to_string()).copied().flatten()
    }

    /// Record the outcome of an indicator calculation.
    pub fn set(&mut self, pair: &Pair, value: Option<f64>) {
        self.averages.insert(pair.to_string(), value);
    }
}

/// One detected opportunity, kept in the bounded recent history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub detected_at: DateTime<Utc>,
    pub cheap_pair: String,
    pub cheap_price: f64,
    pub cheap_ma: f64,
    /// Percent distance of the cheap leg from its average (negative below).
    pub cheap_deviation_pct: f64,
    pub rich_pair: String,
    pub rich_price: f64,
    pub rich_ma: f64,
    /// Percent distance of the rich leg from its average (positive above).
    pub rich_deviation_pct: f64,
    /// Whether the simulated trade completed all three legs.
    pub executed: bool,
}

/// Running totals for the current process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub trades_attempted: u64,
    pub trades_completed: u64,
    pub trades_aborted: u64,
    /// Sum of completed trades' P&L in quote currency.
    pub cumulative_pnl: Decimal,
}

/// The complete, self-contained payload delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    pub prices: MarketSnapshot,
    #[serde(rename = "mas")]
    pub moving_averages: IndicatorSnapshot,
    pub portfolio: Portfolio,
    pub last_trade_log: Vec<String>,
    pub opportunity_detected: bool,
    pub recent_opportunities: Vec<OpportunityRecord>,
    pub stats: SessionStats,
}

impl StateSnapshot {
    /// Canonical JSON text sent to every subscriber.
    pub fn to_json(&self) -> Result<String, TriarbError> {
        Ok(serde_json::to_string(self)?)
    }
}
