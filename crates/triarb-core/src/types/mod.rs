//! Core data types.

mod ohlcv;
mod pair;
mod portfolio;
mod snapshot;
mod timeframe;

pub use ohlcv::Bar;
pub use pair::{Pair, Route};
pub use portfolio::Portfolio;
pub use snapshot::{
    IndicatorSnapshot, MarketSnapshot, OpportunityRecord, SessionStats, StateSnapshot,
};
pub use timeframe::Timeframe;
