//! Stream tailing.
//!
//! Wires the HTTP source, file store and a channel handler into an
//! `EventStream`, prints batches as they arrive and pauses on Ctrl-C so the
//! next run picks up where this one stopped.

use crate::config::Config;
use anyhow::{bail, Context, Result};
use evstream_core::{ChannelHandler, EventBatch, EventStream, FileStore, FirstPoll};
use evstream_transport::{HttpConfig, HttpEventSource};
use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

/// Run the tail loop until Ctrl-C or a permanent failure.
///
/// # Errors
///
/// Returns an error if the stream cannot be set up, the server denies
/// access, or the position cannot be saved on exit.
pub async fn run(config: Config, reset: bool) -> Result<()> {
    let source = HttpEventSource::new(HttpConfig {
        base_url: config.server.base_url.clone(),
        access_token: config.server.access_token.clone(),
        request_grace: config.request_grace(),
    })
    .context("Failed to create HTTP event source")?;

    let store = FileStore::new(config.store_dir());
    let (handler, mut batches) = ChannelHandler::new();

    let stream = EventStream::restore(
        Arc::new(source),
        Arc::new(handler),
        Arc::new(store),
        config.stream.clone(),
    )
    .context("Failed to restore stream settings")?;

    if reset {
        stream.stop().context("Failed to reset stream position")?;
    }

    let first = stream.resume().context("Event stream is already active")?;
    tail(
        &stream,
        first,
        &mut batches,
        &mut io::stdout(),
        tokio::signal::ctrl_c(),
    )
    .await?;

    stream.pause().context("Failed to save stream position")?;
    info!(from = %stream.settings().from(), "Saved stream position");

    Ok(())
}

/// Print batches from a resumed stream until `shutdown` resolves, the output
/// closes or the server denies access.
async fn tail(
    stream: &EventStream,
    mut first: FirstPoll,
    batches: &mut UnboundedReceiver<EventBatch>,
    out: &mut impl Write,
    shutdown: impl Future<Output = io::Result<()>>,
) -> Result<()> {
    tokio::pin!(shutdown);
    let mut active = stream.watch_active();
    let mut first_done = false;

    loop {
        if !*active.borrow_and_update() {
            // Only a denied request ends the loop while we are tailing
            error!("Poll loop stopped by the server, dropping saved position");
            return deny_access(stream, batches, out);
        }

        tokio::select! {
            result = &mut first, if !first_done => {
                first_done = true;
                match result {
                    Ok(chunk) => info!(events = chunk.len(), next = %chunk.end, "Connected"),
                    Err(e) if e.is_forbidden() => {
                        error!(error = %e, "Access denied, dropping saved position");
                        return deny_access(stream, batches, out);
                    }
                    Err(e) => warn!(error = %e, "First poll failed, retrying in the background"),
                }
            }

            Some(batch) = batches.recv() => {
                if let Err(e) = print_batch(out, &batch) {
                    debug!(error = %e, "Output closed");
                    return Ok(());
                }
            }

            Ok(()) = active.changed() => {}

            _ = &mut shutdown => {
                info!("Interrupted");
                return Ok(());
            }
        }
    }
}

/// Flush what was already received, then forget the saved position.
fn deny_access(
    stream: &EventStream,
    batches: &mut UnboundedReceiver<EventBatch>,
    out: &mut impl Write,
) -> Result<()> {
    while let Ok(batch) = batches.try_recv() {
        if print_batch(out, &batch).is_err() {
            break;
        }
    }
    stream.stop().context("Failed to clear stream position")?;
    bail!("Event stream access denied")
}

/// Write each event of a batch as one JSON line.
fn print_batch(out: &mut impl Write, batch: &EventBatch) -> io::Result<()> {
    for event in &batch.events {
        serde_json::to_writer(&mut *out, event.as_json())?;
        out.write_all(b"\n")?;
    }
    out.flush()
}
