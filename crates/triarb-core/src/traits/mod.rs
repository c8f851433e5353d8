//! Core traits.

mod indicator;
mod market_data;
mod sink;

pub use indicator::Indicator;
pub use market_data::MarketData;
pub use sink::SubscriberSink;
