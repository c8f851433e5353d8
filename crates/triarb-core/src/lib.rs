//! Core types and traits for the arbitrage monitor.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, Pair, Timeframe)
//! - The triangular route and simulated portfolio
//! - State snapshots published to subscribers
//! - Core traits for market data, indicators and subscriber sinks
//! - A cloneable shutdown signal observed at every suspension point

pub mod error;
pub mod shutdown;
pub mod traits;
pub mod types;

pub use error::{DataError, DeliveryError, IndicatorError, TradeError, TriarbError};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use traits::*;
pub use types::*;
