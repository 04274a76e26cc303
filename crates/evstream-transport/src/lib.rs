//! # evstream-transport
//!
//! Transport abstraction layer for the evstream client.
//!
//! The poller never talks to the network directly. It hands a `PollRequest`
//! to an `EventSource` and gets back either an `EventChunk` or a
//! `TransportError` carrying enough classification to decide whether to retry.
//!
//! - **HTTP** - Long-poll `GET /events` over reqwest (feature `http`, default)
//!
//! ```rust,ignore
//! use evstream_transport::{EventSource, PollRequest};
//!
//! async fn tail(source: &dyn EventSource, request: PollRequest) {
//!     match source.poll(&request).await {
//!         Ok(chunk) => println!("{} events, next from {}", chunk.len(), chunk.end),
//!         Err(e) if e.is_forbidden() => eprintln!("access revoked: {}", e),
//!         Err(e) => eprintln!("transient: {}", e),
//!     }
//! }
//! ```

pub mod traits;

#[cfg(feature = "http")]
pub mod http;

pub use traits::{EventSource, PollRequest, TransportError, DEFAULT_POLL_TIMEOUT};

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpEventSource};
