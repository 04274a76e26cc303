//! Delivery of received events.

use evstream_protocol::RawEvent;
use tokio::sync::mpsc;
use tracing::warn;

/// An ordered batch of events handed to an `EventHandler`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBatch {
    /// Events in stream order.
    pub events: Vec<RawEvent>,
    /// `true` for incremental updates (append/dedup), `false` for a
    /// historical backfill that should replace what the handler holds.
    pub live: bool,
}

impl EventBatch {
    /// A batch of incremental updates.
    #[must_use]
    pub fn live(events: Vec<RawEvent>) -> Self {
        Self { events, live: true }
    }

    /// A batch of historical events.
    #[must_use]
    pub fn backfill(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            live: false,
        }
    }
}

/// Consumer of event batches.
///
/// Called from the poll loop, so implementations must return promptly and
/// hand heavy work off elsewhere.
pub trait EventHandler: Send + Sync {
    /// Apply a batch.
    fn handle(&self, batch: EventBatch);
}

impl<F> EventHandler for F
where
    F: Fn(EventBatch) + Send + Sync,
{
    fn handle(&self, batch: EventBatch) {
        self(batch);
    }
}

/// Handler forwarding every batch into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<EventBatch>,
}

impl ChannelHandler {
    /// Create a handler and the receiver its batches arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EventBatch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventHandler for ChannelHandler {
    fn handle(&self, batch: EventBatch) {
        if self.tx.send(batch).is_err() {
            warn!("Event receiver dropped, discarding batch");
        }
    }
}
