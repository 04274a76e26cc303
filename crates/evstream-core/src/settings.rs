//! The stream cursor record.
//!
//! `StreamSettings` decides what the next poll looks like and whether the loop
//! keeps going. Only `EventStream` mutates a live record; everything handed
//! out of this crate is a snapshot.

use bytes::Bytes;
use evstream_protocol::{codec, ProtocolError, StreamToken};
use evstream_transport::PollRequest;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Store key the settings record is saved under.
pub const SETTINGS_KEY: &str = "streamSettings";

/// Position and polling flags of the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    /// Cursor the next poll starts from.
    from: StreamToken,
    /// Optional upper bound cursor.
    #[serde(default)]
    to: Option<StreamToken>,
    /// Optional maximum events per poll.
    #[serde(default)]
    limit: Option<u32>,
    /// Whether the loop reschedules itself after the current request.
    #[serde(default)]
    should_poll: bool,
    /// Whether a poll loop is live and its responses are honoured.
    #[serde(default)]
    is_active: bool,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            from: StreamToken::end(),
            to: None,
            limit: None,
            should_poll: false,
            is_active: false,
        }
    }
}

impl StreamSettings {
    /// Create settings positioned at the end of the stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor the next poll starts from.
    #[must_use]
    pub fn from(&self) -> &StreamToken {
        &self.from
    }

    /// Upper bound cursor, if set.
    #[must_use]
    pub fn to(&self) -> Option<&StreamToken> {
        self.to.as_ref()
    }

    /// Maximum events per poll, if set.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Whether the loop will poll again after the current request.
    #[must_use]
    pub fn should_poll(&self) -> bool {
        self.should_poll
    }

    /// Whether a poll loop is currently live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Build the request for the next poll.
    #[must_use]
    pub fn poll_request(&self, timeout: Duration) -> PollRequest {
        PollRequest::new(self.from.clone(), timeout)
            .with_to(self.to.clone())
            .with_limit(self.limit)
    }

    /// Encode for the settings store.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Bytes, ProtocolError> {
        codec::encode(self)
    }

    /// Decode a record read back from the settings store.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is not valid settings JSON.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        codec::decode(data)
    }

    /// A persisted record with its loop flags cleared.
    ///
    /// No poll loop survives a restart, so whatever flags were saved, the
    /// restored record is idle and only the cursor and bounds carry over.
    #[must_use]
    pub(crate) fn restored(mut self) -> Self {
        self.should_poll = false;
        self.is_active = false;
        self
    }

    pub(crate) fn begin(&mut self) {
        self.should_poll = true;
        self.is_active = true;
    }

    pub(crate) fn interrupt(&mut self) {
        self.should_poll = false;
        self.is_active = false;
    }

    /// Stop rescheduling after the current request.
    pub(crate) fn halt(&mut self) {
        self.should_poll = false;
    }

    pub(crate) fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Move the cursor to a server-issued token.
    pub(crate) fn advance(&mut self, to: StreamToken) {
        self.from = to;
    }

    pub(crate) fn reset_cursor(&mut self) {
        self.from = StreamToken::end();
    }

    pub(crate) fn set_bounds(&mut self, to: Option<StreamToken>, limit: Option<u32>) {
        self.to = to;
        self.limit = limit;
    }
}
