//! Market data sources for the arbitrage monitor.

mod bitget;
mod csv_source;
mod guarded;
mod rate_limit;

pub use bitget::{BitgetClient, BitgetConfig};
pub use csv_source::CsvMarketData;
pub use guarded::GuardedMarketData;
pub use rate_limit::RateLimiter;
