//! Shared state store and cycle scheduler.

mod scheduler;
mod state;

pub use scheduler::{CycleReport, CycleScheduler, SchedulerConfig};
pub use state::BotState;
