//! Subscriber registry and snapshot broadcast.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};
use triarb_core::traits::SubscriberSink;
use triarb_core::types::StateSnapshot;
use uuid::Uuid;

/// Opaque handle for one connected subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery counts for one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    /// Subscribers whose delivery failed; they have been removed.
    pub dropped: usize,
}

/// The set of connected subscribers.
///
/// Shared between the transport, which adds and removes subscribers as
/// connections come and go, and the scheduler, which publishes. The lock is
/// never held while a sink is being written to.
#[derive(Default)]
pub struct SubscriberRegistry {
    sinks: Mutex<HashMap<SubscriberId, Arc<dyn SubscriberSink>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. Subscribing an id twice keeps the first sink.
    pub fn subscribe(&self, id: SubscriberId, sink: Arc<dyn SubscriberSink>) {
        let mut sinks = self.sinks.lock().unwrap_or_else(|e| e.into_inner());
        sinks.entry(id).or_insert(sink);
        debug!(subscriber = %id, total = sinks.len(), "subscriber added");
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut sinks = self.sinks.lock().unwrap_or_else(|e| e.into_inner());
        let removed = sinks.remove(&id).is_some();
        if removed {
            debug!(subscriber = %id, total = sinks.len(), "subscriber removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sinks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize the snapshot once and push it to every subscriber.
    pub fn publish(&self, snapshot: &StateSnapshot) -> PublishReport {
        match snapshot.to_json() {
            Ok(message) => self.publish_text(&message),
            Err(e) => {
                error!(cycle = snapshot.cycle, error = %e, "failed to encode snapshot");
                PublishReport::default()
            }
        }
    }

    /// Push a message to every subscriber, dropping those that fail.
    pub fn publish_text(&self, message: &str) -> PublishReport {
        let targets: Vec<(SubscriberId, Arc<dyn SubscriberSink>)> = {
            let sinks = self.sinks.lock().unwrap_or_else(|e| e.into_inner());
            sinks.iter().map(|(id, s)| (*id, Arc::clone(s))).collect()
        };

        let mut report = PublishReport::default();
        let mut failed = Vec::new();
        for (id, sink) in targets {
            match sink.deliver(message) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(subscriber = %id, error = %e, "delivery failed, dropping subscriber");
                    failed.push((id, sink));
                }
            }
        }

        if !failed.is_empty() {
            let mut sinks = self.sinks.lock().unwrap_or_else(|e| e.into_inner());
            for (id, sink) in failed {
                // Only remove the sink that failed, not a newer one under the same id
                if sinks.get(&id).is_some_and(|current| Arc::ptr_eq(current, &sink)) {
                    sinks.remove(&id);
                }
                report.dropped += 1;
            }
        }

        report
    }
}
