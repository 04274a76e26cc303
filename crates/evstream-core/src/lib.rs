//! # evstream-core
//!
//! Resumable long-poll client for a remote event stream.
//!
//! This crate provides the pieces that keep a client attached to the stream:
//!
//! - **Settings** - The cursor record (`from`, `to`, `limit`, poll flags)
//! - **EventStream** - The poll loop plus its `resume` / `pause` / `stop` controls
//! - **Handler** - Where received event batches are delivered
//! - **Store** - Persistence of the settings record between runs
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ EventStream │────▶│ EventSource │────▶│   server    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!    │       │
//!    │       ▼
//!    │  ┌──────────────┐
//!    │  │ EventHandler │
//!    │  └──────────────┘
//!    ▼
//! ┌───────────────┐
//! │ SettingsStore │
//! └───────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod settings;
pub mod store;
pub mod stream;

pub use config::StreamConfig;
pub use error::StreamError;
pub use handler::{ChannelHandler, EventBatch, EventHandler};
pub use settings::{StreamSettings, SETTINGS_KEY};
pub use store::{FileStore, MemoryStore, SettingsStore, StoreError};
pub use stream::{EventStream, FirstPoll};
