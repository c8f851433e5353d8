//! Paper execution of the triangular route.

mod paper;

pub use paper::{PaperTrader, SimulatorConfig, TradeOutcome};
