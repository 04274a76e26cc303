//! Event source traits for evstream.
//!
//! These define what the poller needs from a transport, so the poll loop can be
//! driven by HTTP in production and by a scripted source in tests.

use async_trait::async_trait;
use evstream_protocol::{EventChunk, ProtocolError, StreamToken};
use std::time::Duration;
use thiserror::Error;

/// How long the server may hold a poll open before answering empty.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(30_000);

/// HTTP status that means access is permanently denied.
const STATUS_FORBIDDEN: u16 = 403;

/// A single long-poll request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    /// Cursor to poll from.
    pub from: StreamToken,
    /// Optional upper bound cursor.
    pub to: Option<StreamToken>,
    /// Optional maximum number of events to return.
    pub limit: Option<u32>,
    /// Server-side wait before answering with an empty chunk.
    pub timeout: Duration,
}

impl PollRequest {
    /// Create a request from a cursor with the given server-side timeout.
    #[must_use]
    pub fn new(from: StreamToken, timeout: Duration) -> Self {
        Self {
            from,
            to: None,
            limit: None,
            timeout,
        }
    }

    /// Set the upper bound cursor.
    #[must_use]
    pub fn with_to(mut self, to: Option<StreamToken>) -> Self {
        self.to = to;
        self
    }

    /// Set the event limit.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// The timeout in whole milliseconds, as sent on the wire.
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// Transport errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,

    /// The request could not be sent or the connection failed.
    #[error("Request failed: {0}")]
    Request(String),

    /// The response body was not a valid event chunk.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// The HTTP-like status code, if the server produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a permanent authorization failure (403).
    ///
    /// Polling must not be retried after one of these.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(STATUS_FORBIDDEN)
    }
}

impl From<ProtocolError> for TransportError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e.to_string())
    }
}

/// A remote stream of events that can be long-polled.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Poll for events after `request.from`.
    ///
    /// Resolves when the server answers, which may be after up to
    /// `request.timeout` with an empty chunk.
    async fn poll(&self, request: &PollRequest) -> Result<EventChunk, TransportError>;

    /// Get the source name (e.g., "http").
    fn name(&self) -> &'static str;
}
