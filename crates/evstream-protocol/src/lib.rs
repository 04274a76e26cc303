//! # evstream-protocol
//!
//! Wire types for the evstream long-poll client.
//!
//! The event stream endpoint answers every poll with a chunk of raw events
//! plus the cursor to poll from next. This crate defines those types and the
//! JSON codec used to read them off the wire.
//!
//! ## Types
//!
//! - `StreamToken` - Opaque cursor into the stream (`END` / `START` sentinels)
//! - `RawEvent` - A single event, kept as uninterpreted JSON
//! - `EventChunk` - One poll response: `{chunk, start, end}`
//!
//! ## Example
//!
//! ```rust
//! use evstream_protocol::{codec, StreamToken};
//!
//! let body = br#"{"chunk": [{"type": "m.presence"}], "start": "END", "end": "s72_4"}"#;
//! let chunk = codec::decode_chunk(body).unwrap();
//!
//! assert_eq!(chunk.len(), 1);
//! assert_eq!(chunk.end, StreamToken::new("s72_4"));
//! ```

pub mod codec;
pub mod events;
pub mod token;

pub use codec::{decode_chunk, encode, ProtocolError};
pub use events::{EventChunk, RawEvent};
pub use token::StreamToken;
