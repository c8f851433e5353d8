//! Configuration structures.

use config::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use triarb_broker::SimulatorConfig;
use triarb_core::error::TriarbError;
use triarb_core::types::{Pair, Portfolio, Route, Timeframe};
use triarb_data::BitgetConfig;
use triarb_engine::SchedulerConfig;
use triarb_strategy::OpportunityConfig;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub exchange: ExchangeSettings,
    #[serde(default)]
    pub strategy: StrategySettings,
    #[serde(default)]
    pub trade: TradeSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "triarb".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Market data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
    /// Requests admitted per rate window
    pub rate_limit: usize,
    pub rate_window_ms: u64,
    /// Replay candles from `<dir>/<SYMBOL>.csv` instead of calling the exchange
    pub csv_dir: Option<String>,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.bitget.com".to_string(),
            request_timeout_ms: 10_000,
            rate_limit: 20,
            rate_window_ms: 1_000,
            csv_dir: None,
        }
    }
}

/// Route and signal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub cheap_pair: Pair,
    pub rich_pair: Pair,
    pub cross_pair: Pair,
    pub ma_window: usize,
    pub timeframe: Timeframe,
    pub depression_threshold: f64,
    pub elevation_threshold: f64,
}

impl Default for StrategySettings {
    fn default() -> Self {
        let route = Route::default();
        let signal = OpportunityConfig::default();
        Self {
            cheap_pair: route.cheap().clone(),
            rich_pair: route.rich().clone(),
            cross_pair: route.cross().clone(),
            ma_window: 20,
            timeframe: Timeframe::Hour12,
            depression_threshold: signal.depression_threshold,
            elevation_threshold: signal.elevation_threshold,
        }
    }
}

/// Simulated execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeSettings {
    pub notional: Decimal,
    pub fee_rate: Decimal,
    pub leg_delay_ms: u64,
    pub min_notional: Decimal,
    pub revalidate_prices: bool,
    pub starting_balances: BTreeMap<String, Decimal>,
}

impl Default for TradeSettings {
    fn default() -> Self {
        let starting_balances = [("USDT", dec!(1000)), ("XRP", dec!(0)), ("BTC", dec!(0))]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            notional: dec!(100),
            fee_rate: dec!(0.001),
            leg_delay_ms: 10_000,
            min_notional: dec!(10),
            revalidate_prices: true,
            starting_balances,
        }
    }
}

/// Cycle timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub cycle_interval_ms: u64,
    /// Detected opportunities kept in the published snapshot
    pub history_len: usize,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 30_000,
            history_len: 5,
        }
    }
}

/// Subscriber listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Outbound messages queued per subscriber before it is dropped
    pub buffer: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
            buffer: 16,
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.route().map_err(|e| ConfigError::Message(e.to_string()))?;
        self.opportunity_config()
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        if self.strategy.ma_window == 0 {
            return Err(ConfigError::Message(
                "strategy.ma_window must be greater than 0".into(),
            ));
        }
        if self.trade.fee_rate < Decimal::ZERO || self.trade.fee_rate >= Decimal::ONE {
            return Err(ConfigError::Message("trade.fee_rate must be in [0, 1)".into()));
        }
        if self.trade.notional < self.trade.min_notional {
            return Err(ConfigError::Message(format!(
                "trade.notional {} is below the minimum {}",
                self.trade.notional, self.trade.min_notional
            )));
        }
        if self.schedule.cycle_interval_ms == 0 {
            return Err(ConfigError::Message(
                "schedule.cycle_interval_ms must be greater than 0".into(),
            ));
        }
        if self.exchange.request_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "exchange.request_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.server.buffer == 0 {
            return Err(ConfigError::Message("server.buffer must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn route(&self) -> Result<Route, TriarbError> {
        Route::new(
            self.strategy.cheap_pair.clone(),
            self.strategy.rich_pair.clone(),
            self.strategy.cross_pair.clone(),
        )
    }

    pub fn opportunity_config(&self) -> OpportunityConfig {
        OpportunityConfig {
            depression_threshold: self.strategy.depression_threshold,
            elevation_threshold: self.strategy.elevation_threshold,
        }
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            notional: self.trade.notional,
            fee_rate: self.trade.fee_rate,
            leg_delay: Duration::from_millis(self.trade.leg_delay_ms),
            revalidate_prices: self.trade.revalidate_prices,
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            cycle_interval: Duration::from_millis(self.schedule.cycle_interval_ms),
            ma_window: self.strategy.ma_window,
            timeframe: self.strategy.timeframe,
            history_len: self.schedule.history_len,
        }
    }

    pub fn bitget_config(&self) -> BitgetConfig {
        BitgetConfig {
            base_url: self.exchange.base_url.clone(),
            request_timeout: self.fetch_timeout(),
            rate_limit: self.exchange.rate_limit,
            rate_window: Duration::from_millis(self.exchange.rate_window_ms),
        }
    }

    /// Upper bound on any single market data call.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.exchange.request_timeout_ms)
    }

    /// Seed allocation. Asset codes are upper-cased since keys from the
    /// config file arrive lower-cased.
    pub fn starting_portfolio(&self) -> Portfolio {
        Portfolio::new(
            self.trade
                .starting_balances
                .iter()
                .map(|(asset, qty)| (asset.to_uppercase(), *qty)),
        )
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, TriarbError> {
        toml::to_string_pretty(self).map_err(|e| TriarbError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulator_config().leg_delay, Duration::from_secs(10));
        assert_eq!(config.scheduler_config().cycle_interval, Duration::from_secs(30));
        assert_eq!(config.scheduler_config().history_len, 5);
        assert_eq!(config.bitget_config().rate_limit, 20);
    }

    #[test]
    fn test_default_renders_as_toml() {
        let text = AppConfig::default().to_toml().unwrap();
        assert!(text.contains("cheap_pair = \"XRP/USDT\""));
        assert!(text.contains("timeframe = \"12h\""));
    }
}
