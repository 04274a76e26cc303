//! JSON codec for stream payloads.
//!
//! Poll responses and persisted client records are both JSON. Bodies are
//! size-checked before parsing so a misbehaving server cannot make the client
//! buffer an unbounded document.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::events::EventChunk;

/// Maximum accepted body size (16 MiB).
pub const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Body exceeds maximum size.
    #[error("Body size {0} exceeds maximum {MAX_BODY_SIZE}")]
    BodyTooLarge(usize),

    /// Malformed or unexpected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if serialization fails or the result is too large.
pub fn encode<T: Serialize>(value: &T) -> Result<Bytes, ProtocolError> {
    let body = serde_json::to_vec(value)?;

    if body.len() > MAX_BODY_SIZE {
        return Err(ProtocolError::BodyTooLarge(body.len()));
    }

    Ok(Bytes::from(body))
}

/// Decode a value from JSON bytes.
///
/// # Errors
///
/// Returns an error if the body is too large or is not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.len() > MAX_BODY_SIZE {
        return Err(ProtocolError::BodyTooLarge(data.len()));
    }

    Ok(serde_json::from_slice(data)?)
}

/// Decode an event stream response body.
///
/// # Errors
///
/// Returns an error if the body is too large or is not a valid chunk.
pub fn decode_chunk(data: &[u8]) -> Result<EventChunk, ProtocolError> {
    decode(data)
}
