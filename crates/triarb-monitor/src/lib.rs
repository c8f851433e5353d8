//! Logging, subscriber registry and WebSocket broadcast.

mod broadcaster;
mod logging;
mod server;

pub use broadcaster::{PublishReport, SubscriberId, SubscriberRegistry};
pub use logging::setup_logging;
pub use server::{ChannelSink, WsServer};
