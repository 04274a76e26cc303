//! Event and chunk types.
//!
//! Events are carried through the client untouched. Interpreting them is the
//! job of whatever handler sits downstream of the poller.

use crate::token::StreamToken;
use serde::{Deserialize, Serialize};

/// A single raw event from the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(serde_json::Value);

impl RawEvent {
    /// Wrap a JSON value as an event.
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying JSON value.
    #[must_use]
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Unwrap into the underlying JSON value.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for RawEvent {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// One response from the event stream endpoint.
///
/// `chunk` is ordered oldest first. `end` is the cursor to poll from next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventChunk {
    /// Events in stream order.
    #[serde(default)]
    pub chunk: Vec<RawEvent>,
    /// Cursor the request was served from.
    #[serde(default)]
    pub start: Option<StreamToken>,
    /// Cursor to resume from.
    pub end: StreamToken,
}

impl EventChunk {
    /// Create a chunk with the given events and next cursor.
    #[must_use]
    pub fn new(chunk: Vec<RawEvent>, end: impl Into<StreamToken>) -> Self {
        Self {
            chunk,
            start: None,
            end: end.into(),
        }
    }

    /// Set the start cursor.
    #[must_use]
    pub fn with_start(mut self, start: impl Into<StreamToken>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Number of events in the chunk.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunk.len()
    }

    /// Whether the long poll timed out without any events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunk.is_empty()
    }
}
