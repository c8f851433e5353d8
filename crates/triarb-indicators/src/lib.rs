//! Moving-average baseline calculation.
//!
//! The detector compares each baseline pair's last price against a simple
//! moving average of its most recent closes over a fixed candle granularity.

pub mod moving_average;

pub use moving_average::{baseline, moving_average, Sma};
