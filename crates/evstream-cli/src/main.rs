//! # evstream
//!
//! Tail a long-poll event stream, printing every event as a JSON line.
//!
//! ## Usage
//!
//! ```bash
//! # Continue from the last saved position
//! evstream
//!
//! # Run with a custom config
//! evstream --config /path/to/evstream.toml
//!
//! # Forget the saved position and start at the live end
//! evstream --reset
//!
//! # Run with environment variables
//! EVSTREAM_BASE_URL=https://example.org EVSTREAM_ACCESS_TOKEN=... evstream
//! ```

mod config;
mod metrics;
mod tail;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "evstream", version, about = "Tail a long-poll event stream")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Discard the saved stream position before starting.
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the events
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evstream=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = config::Config::load(args.config.as_deref())?;

    tracing::info!("Tailing event stream from {}", config.server.base_url);

    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            tracing::error!("Failed to start metrics server: {}", e);
        }
    }

    tail::run(config, args.reset).await
}
