//! Opportunity detection.
//!
//! Flags a triangular trade when the cheap-leg pair trades sufficiently
//! below its moving average while the rich-leg pair trades sufficiently
//! above its own.

mod opportunity;

pub use opportunity::{detect, LegReading, Opportunity, OpportunityConfig};
