//! Stream errors.

use crate::store::StoreError;
use evstream_protocol::ProtocolError;
use evstream_transport::TransportError;
use thiserror::Error;

/// Errors surfaced by `EventStream`.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The first poll after `resume` failed.
    #[error("Poll failed: {0}")]
    Transport(#[from] TransportError),

    /// The first poll was superseded by `pause` / `stop` before it completed.
    #[error("Poll interrupted before it completed")]
    Interrupted,

    /// The settings record could not be saved or loaded.
    #[error("Settings store error: {0}")]
    Store(#[from] StoreError),

    /// The settings record could not be encoded or decoded.
    #[error("Settings codec error: {0}")]
    Codec(#[from] ProtocolError),
}

impl StreamError {
    /// Whether this is a permanent authorization failure from the server.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_forbidden())
    }
}
