//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, ExchangeSettings, LoggingConfig, ScheduleSettings, ServerSettings,
    StrategySettings, TradeSettings,
};

pub use config::ConfigError;

use config::{Config, Environment, File};
use std::path::Path;

/// Prefix for environment overrides, e.g. `TRIARB__TRADE__NOTIONAL=250`.
pub const ENV_PREFIX: &str = "TRIARB";

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    build(File::from(path).required(true), environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn build<F>(file: F, env: Environment) -> Result<AppConfig, ConfigError>
where
    F: config::Source + Send + Sync + 'static,
{
    let config = Config::builder().add_source(file).add_source(env).build()?;
    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}
