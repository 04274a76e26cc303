//! The event stream poll loop and its lifecycle controls.
//!
//! `EventStream` owns the live `StreamSettings`. `resume` spawns a poll loop
//! tagged with a fresh generation; `pause` and `stop` bump the generation so
//! that whatever the old loop is waiting on, its outcome is recognised as
//! stale and dropped when it arrives. The network call itself is never
//! aborted. Only the backoff wait is cut short.

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::handler::{EventBatch, EventHandler};
use crate::metrics;
use crate::settings::StreamSettings;
use crate::store::SettingsStore;
use evstream_protocol::{EventChunk, StreamToken};
use evstream_transport::EventSource;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type FirstPollSender = oneshot::Sender<Result<EventChunk, StreamError>>;

/// Mutable state shared by the controller and the running loop.
struct StreamState {
    settings: StreamSettings,
    /// Bumped by every `resume` / `pause` / `stop`; a loop only applies
    /// effects while its own generation is current.
    generation: u64,
    /// Cancels the backoff wait of the current loop.
    cancel: CancellationToken,
}

struct Inner {
    state: Mutex<StreamState>,
    source: Arc<dyn EventSource>,
    handler: Arc<dyn EventHandler>,
    store: Arc<dyn SettingsStore>,
    config: StreamConfig,
    active: watch::Sender<bool>,
}

/// A resumable long-poll client for one event stream.
///
/// Dropping the stream interrupts any running loop without persisting.
pub struct EventStream {
    inner: Arc<Inner>,
}

impl EventStream {
    /// Create a stream positioned at the end of the remote stream.
    #[must_use]
    pub fn new(
        source: Arc<dyn EventSource>,
        handler: Arc<dyn EventHandler>,
        store: Arc<dyn SettingsStore>,
        config: StreamConfig,
    ) -> Self {
        Self::with_settings(source, handler, store, config, StreamSettings::new())
    }

    /// Create a stream from the settings last saved in `store`.
    ///
    /// A missing record yields fresh settings. The restored stream is idle;
    /// call `resume` to continue from the saved cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the record is corrupt.
    pub fn restore(
        source: Arc<dyn EventSource>,
        handler: Arc<dyn EventHandler>,
        store: Arc<dyn SettingsStore>,
        config: StreamConfig,
    ) -> Result<Self, StreamError> {
        let settings = match store.load(&config.settings_key)? {
            Some(data) => StreamSettings::from_bytes(&data)?.restored(),
            None => StreamSettings::new(),
        };
        info!(from = %settings.from(), "Restored stream settings");

        Ok(Self::with_settings(source, handler, store, config, settings))
    }

    fn with_settings(
        source: Arc<dyn EventSource>,
        handler: Arc<dyn EventHandler>,
        store: Arc<dyn SettingsStore>,
        config: StreamConfig,
        settings: StreamSettings,
    ) -> Self {
        debug!(source = source.name(), "Creating event stream with config: {:?}", config);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(StreamState {
                    settings,
                    generation: 0,
                    cancel: CancellationToken::new(),
                }),
                source,
                handler,
                store,
                config,
                active: watch::channel(false).0,
            }),
        }
    }

    /// Snapshot of the current settings.
    #[must_use]
    pub fn settings(&self) -> StreamSettings {
        self.inner.state.lock().settings.clone()
    }

    /// Whether a poll loop is live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.state.lock().settings.is_active()
    }

    /// Watch whether a poll loop is live.
    ///
    /// The value drops to `false` when the stream is paused or stopped, and
    /// also when the loop ends on its own after the server denies access.
    #[must_use]
    pub fn watch_active(&self) -> watch::Receiver<bool> {
        self.inner.active.subscribe()
    }

    /// Set the upper bound cursor and per-poll event limit.
    ///
    /// Takes effect from the next request.
    pub fn set_bounds(&self, to: Option<StreamToken>, limit: Option<u32>) {
        self.inner.state.lock().settings.set_bounds(to, limit);
    }

    /// Start polling from the current cursor.
    ///
    /// Returns `None` if a loop is already live. Otherwise spawns the loop and
    /// returns a future for the outcome of its first request only; later
    /// requests are observable through the handler alone.
    ///
    /// Must be called within a Tokio runtime.
    pub fn resume(&self) -> Option<FirstPoll> {
        let (generation, cancel) = {
            let mut state = self.inner.state.lock();
            if state.settings.is_active() {
                debug!("Already active, ignoring resume");
                return None;
            }

            state.generation += 1;
            state.settings.begin();
            state.cancel = CancellationToken::new();

            info!(
                from = %state.settings.from(),
                generation = state.generation,
                "Resuming event stream"
            );
            self.inner.publish_active(true);
            (state.generation, state.cancel.clone())
        };

        let (tx, rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run(generation, cancel, tx).await;
        });

        Some(FirstPoll { rx })
    }

    /// Stop polling and save the cursor. `resume` continues from here.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings could not be persisted. Polling is
    /// stopped regardless.
    pub fn pause(&self) -> Result<(), StreamError> {
        let settings = self.inner.interrupt(false);
        info!(from = %settings.from(), "Paused event stream");
        self.inner.persist(&settings)
    }

    /// Stop polling and forget the cursor. The next `resume` starts from the
    /// end of the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings could not be persisted. Polling is
    /// stopped regardless.
    pub fn stop(&self) -> Result<(), StreamError> {
        let settings = self.inner.interrupt(true);
        info!("Stopped event stream");
        self.inner.persist(&settings)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.inner.interrupt(false);
    }
}

impl Inner {
    /// Invalidate the running loop and return the resulting settings.
    fn interrupt(&self, reset_cursor: bool) -> StreamSettings {
        let mut state = self.state.lock();
        state.generation += 1;
        state.cancel.cancel();
        state.settings.interrupt();
        if reset_cursor {
            state.settings.reset_cursor();
        }
        self.publish_active(false);
        state.settings.clone()
    }

    fn publish_active(&self, active: bool) {
        metrics::set_active(active);
        self.active.send_replace(active);
    }

    fn persist(&self, settings: &StreamSettings) -> Result<(), StreamError> {
        let data = settings.to_bytes()?;
        self.store
            .save(&self.config.settings_key, data)
            .map_err(|e| {
                error!(error = %e, "Failed to save stream settings");
                StreamError::from(e)
            })
    }

    async fn run(
        self: Arc<Self>,
        generation: u64,
        cancel: CancellationToken,
        first: FirstPollSender,
    ) {
        let mut first = Some(first);

        loop {
            let request = {
                let state = self.state.lock();
                if state.generation != generation || !state.settings.should_poll() {
                    break;
                }
                state.settings.poll_request(self.config.poll_timeout())
            };

            debug!(from = %request.from, generation, "Polling event stream");
            let outcome = self.source.poll(&request).await;

            match outcome {
                Ok(chunk) => {
                    {
                        let mut state = self.state.lock();
                        if state.generation != generation {
                            debug!(generation, "Got response but now inactive, dropping data");
                            metrics::record_stale();
                            return;
                        }
                        state.settings.advance(chunk.end.clone());
                    }

                    debug!(
                        from = %request.from,
                        to = %chunk.end,
                        events = chunk.len(),
                        "Got response"
                    );
                    metrics::record_poll("ok");
                    metrics::record_events(chunk.len());

                    match first.take() {
                        Some(tx) => {
                            self.handler.handle(EventBatch::live(chunk.chunk.clone()));
                            let _ = tx.send(Ok(chunk));
                        }
                        None => self.handler.handle(EventBatch::live(chunk.chunk)),
                    }
                }
                Err(err) => {
                    let should_poll = {
                        let mut state = self.state.lock();
                        if state.generation != generation {
                            debug!(generation, error = %err, "Got error but now inactive, dropping it");
                            metrics::record_stale();
                            return;
                        }
                        if err.is_forbidden() {
                            state.settings.halt();
                        }
                        state.settings.should_poll()
                    };

                    warn!(
                        from = %request.from,
                        status = ?err.status(),
                        error = %err,
                        retry = should_poll,
                        "Event stream poll failed"
                    );
                    metrics::record_poll(if err.is_forbidden() { "forbidden" } else { "error" });

                    if let Some(tx) = first.take() {
                        let _ = tx.send(Err(err.into()));
                    }

                    if !should_poll {
                        break;
                    }

                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(self.config.error_backoff()) => {}
                    }
                }
            }
        }

        let mut state = self.state.lock();
        if state.generation == generation {
            state.settings.deactivate();
            self.publish_active(false);
            info!(generation, "Stopping poll");
        }
    }
}

/// Outcome of the first request issued by `EventStream::resume`.
///
/// Resolves to `StreamError::Interrupted` if the stream is paused or stopped
/// before that request completes.
#[must_use = "the first poll outcome is only observable through this future"]
pub struct FirstPoll {
    rx: oneshot::Receiver<Result<EventChunk, StreamError>>,
}

impl Future for FirstPoll {
    type Output = Result<EventChunk, StreamError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(StreamError::Interrupted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ChannelHandler;
    use crate::settings::SETTINGS_KEY;
    use crate::store::{FileStore, MemoryStore};
    use async_trait::async_trait;
    use evstream_protocol::RawEvent;
    use evstream_transport::{PollRequest, TransportError};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::{timeout, Instant};

    type Responder = oneshot::Sender<Result<EventChunk, TransportError>>;

    /// Event source whose every request is answered by the test.
    struct ScriptedSource {
        calls: mpsc::UnboundedSender<(PollRequest, Responder)>,
    }

    #[async_trait]
    impl EventSource for ScriptedSource {
        async fn poll(&self, request: &PollRequest) -> Result<EventChunk, TransportError> {
            let (tx, rx) = oneshot::channel();
            self.calls
                .send((request.clone(), tx))
                .map_err(|_| TransportError::Other("test finished".into()))?;
            rx.await
                .unwrap_or_else(|_| Err(TransportError::Other("responder dropped".into())))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    struct Harness {
        stream: EventStream,
        calls: mpsc::UnboundedReceiver<(PollRequest, Responder)>,
        batches: mpsc::UnboundedReceiver<EventBatch>,
        store: Arc<dyn SettingsStore>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_store(Arc::new(MemoryStore::new()))
        }

        fn with_store(store: Arc<dyn SettingsStore>) -> Self {
            let (calls_tx, calls) = mpsc::unbounded_channel();
            let (handler, batches) = ChannelHandler::new();
            let stream = EventStream::restore(
                Arc::new(ScriptedSource { calls: calls_tx }),
                Arc::new(handler),
                store.clone(),
                StreamConfig::default(),
            )
            .unwrap();

            Self {
                stream,
                calls,
                batches,
                store,
            }
        }

        async fn next_call(&mut self) -> (PollRequest, Responder) {
            self.calls.recv().await.expect("poll loop issued a request")
        }

        async fn no_call_within(&mut self, wait: Duration) -> bool {
            timeout(wait, self.calls.recv()).await.is_err()
        }

        async fn no_batch_within(&mut self, wait: Duration) -> bool {
            timeout(wait, self.batches.recv()).await.is_err()
        }

        fn saved(&self) -> StreamSettings {
            let data = self.store.load(SETTINGS_KEY).unwrap().expect("settings saved");
            StreamSettings::from_bytes(&data).unwrap()
        }
    }

    fn event(n: u64) -> RawEvent {
        RawEvent::new(json!({"type": "m.test", "n": n}))
    }

    fn status(code: u16) -> TransportError {
        TransportError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_forwards_live_batch_and_repolls() {
        let mut h = Harness::new();

        let first = h.stream.resume().unwrap();
        let (request, respond) = h.next_call().await;
        assert!(request.from.is_end());
        assert_eq!(request.timeout, Duration::from_millis(30_000));

        respond
            .send(Ok(EventChunk::new(vec![event(1), event(2)], "tok1")))
            .unwrap();

        let chunk = first.await.unwrap();
        assert_eq!(chunk.end, StreamToken::new("tok1"));

        let batch = h.batches.recv().await.unwrap();
        assert!(batch.live);
        assert_eq!(batch.events, vec![event(1), event(2)]);
        assert_eq!(h.stream.settings().from(), &StreamToken::new("tok1"));

        let started = Instant::now();
        let (request, _respond) = h.next_call().await;
        assert_eq!(request.from, StreamToken::new("tok1"));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_follows_every_response_in_order() {
        let mut h = Harness::new();
        let _first = h.stream.resume().unwrap();

        for n in 1..=5u64 {
            let (request, respond) = h.next_call().await;
            let expected_from = if n == 1 {
                StreamToken::end()
            } else {
                StreamToken::new(format!("tok{}", n - 1))
            };
            assert_eq!(request.from, expected_from);

            respond
                .send(Ok(EventChunk::new(vec![event(n)], format!("tok{}", n))))
                .unwrap();

            let batch = h.batches.recv().await.unwrap();
            assert_eq!(batch.events, vec![event(n)]);
            assert!(batch.live);
        }

        let (request, _respond) = h.next_call().await;
        assert_eq!(request.from, StreamToken::new("tok5"));
        assert_eq!(h.stream.settings().from(), &StreamToken::new("tok5"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_retries_after_backoff() {
        let mut h = Harness::new();

        let first = h.stream.resume().unwrap();
        let (_request, respond) = h.next_call().await;
        let failed_at = Instant::now();
        respond.send(Err(status(500))).unwrap();

        let err = first.await.unwrap_err();
        assert!(matches!(
            err,
            StreamError::Transport(TransportError::Status { status: 500, .. })
        ));

        let (request, _respond) = h.next_call().await;
        assert_eq!(failed_at.elapsed(), Duration::from_millis(5_000));
        assert!(request.from.is_end());

        let settings = h.stream.settings();
        assert!(settings.should_poll());
        assert!(settings.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_errors_keep_retrying_silently() {
        let mut h = Harness::new();
        let first = h.stream.resume().unwrap();

        let (_request, respond) = h.next_call().await;
        respond.send(Ok(EventChunk::new(Vec::new(), "tok1"))).unwrap();
        assert!(first.await.is_ok());
        h.batches.recv().await.unwrap();

        for _ in 0..3 {
            let (request, respond) = h.next_call().await;
            assert_eq!(request.from, StreamToken::new("tok1"));
            respond.send(Err(TransportError::Timeout)).unwrap();
        }

        let (request, respond) = h.next_call().await;
        assert_eq!(request.from, StreamToken::new("tok1"));
        respond
            .send(Ok(EventChunk::new(vec![event(7)], "tok2")))
            .unwrap();

        let batch = h.batches.recv().await.unwrap();
        assert_eq!(batch.events, vec![event(7)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forbidden_stops_polling() {
        let mut h = Harness::new();

        let first = h.stream.resume().unwrap();
        let (_request, respond) = h.next_call().await;
        respond.send(Err(status(403))).unwrap();

        let err = first.await.unwrap_err();
        assert!(err.is_forbidden());

        assert!(h.no_call_within(Duration::from_secs(60)).await);
        let settings = h.stream.settings();
        assert!(!settings.should_poll());
        assert!(!settings.is_active());

        // An explicit resume starts polling again.
        let _again = h.stream.resume().expect("idle stream resumes");
        let (request, _respond) = h.next_call().await;
        assert!(request.from.is_end());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_active_drops_on_forbidden_mid_session() {
        let mut h = Harness::new();
        let mut active = h.stream.watch_active();
        assert!(!*active.borrow_and_update());

        let _first = h.stream.resume().unwrap();
        assert!(*active.borrow_and_update());

        let (_request, respond) = h.next_call().await;
        respond.send(Ok(EventChunk::new(vec![event(1)], "tok1"))).unwrap();
        h.batches.recv().await.unwrap();

        let (_request, respond) = h.next_call().await;
        respond.send(Err(status(403))).unwrap();

        active.changed().await.unwrap();
        assert!(!*active.borrow_and_update());
        assert!(!h.stream.settings().should_poll());
        assert_eq!(h.stream.settings().from(), &StreamToken::new("tok1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_while_active_is_noop() {
        let mut h = Harness::new();

        let _first = h.stream.resume().unwrap();
        assert!(h.stream.resume().is_none());

        let (_request, _respond) = h.next_call().await;
        assert!(h.stream.resume().is_none());
        assert!(h.no_call_within(Duration::from_secs(60)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_persists_cursor_and_resume_continues() {
        let mut h = Harness::new();
        let _first = h.stream.resume().unwrap();

        let (_request, respond) = h.next_call().await;
        respond.send(Ok(EventChunk::new(vec![event(1)], "tok1"))).unwrap();
        h.batches.recv().await.unwrap();

        let (_outstanding, _respond) = h.next_call().await;
        h.stream.pause().unwrap();

        let saved = h.saved();
        assert_eq!(saved.from(), &StreamToken::new("tok1"));
        assert!(!saved.should_poll());
        assert!(!saved.is_active());

        let _resumed = h.stream.resume().unwrap();
        let (request, _respond) = h.next_call().await;
        assert_eq!(request.from, StreamToken::new("tok1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_after_pause_is_discarded() {
        let mut h = Harness::new();
        let first = h.stream.resume().unwrap();

        let (_request, respond) = h.next_call().await;
        respond.send(Ok(EventChunk::new(vec![event(1)], "tok1"))).unwrap();
        first.await.unwrap();
        h.batches.recv().await.unwrap();

        let (_request, respond) = h.next_call().await;
        h.stream.pause().unwrap();
        respond.send(Ok(EventChunk::new(vec![event(2)], "tok2"))).unwrap();

        assert!(h.no_batch_within(Duration::from_secs(60)).await);
        assert!(h.no_call_within(Duration::from_secs(60)).await);
        assert_eq!(h.stream.settings().from(), &StreamToken::new("tok1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_error_after_resume_does_not_retry() {
        let mut h = Harness::new();
        let stale_first = h.stream.resume().unwrap();
        let (_request, stale_respond) = h.next_call().await;

        h.stream.pause().unwrap();
        let _first = h.stream.resume().unwrap();
        let (_request, _respond) = h.next_call().await;

        stale_respond.send(Err(status(500))).unwrap();
        assert!(matches!(stale_first.await, Err(StreamError::Interrupted)));

        // Only the current loop may issue requests, even after the backoff
        assert!(h.no_call_within(Duration::from_secs(60)).await);
        assert!(h.stream.is_active());
        assert!(h.stream.settings().should_poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_interrupted_by_pause() {
        let mut h = Harness::new();
        let first = h.stream.resume().unwrap();

        let (_request, respond) = h.next_call().await;
        h.stream.pause().unwrap();
        respond.send(Ok(EventChunk::new(vec![event(1)], "tok1"))).unwrap();

        assert!(matches!(first.await, Err(StreamError::Interrupted)));
        assert!(h.stream.settings().from().is_end());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_during_backoff_cancels_retry() {
        let mut h = Harness::new();
        let first = h.stream.resume().unwrap();

        let (_request, respond) = h.next_call().await;
        respond.send(Err(status(502))).unwrap();
        assert!(first.await.is_err());

        h.stream.pause().unwrap();
        assert!(h.no_call_within(Duration::from_secs(60)).await);
        assert!(!h.stream.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_resets_cursor_and_persists() {
        let mut h = Harness::new();
        let _first = h.stream.resume().unwrap();

        let (_request, respond) = h.next_call().await;
        respond.send(Ok(EventChunk::new(vec![event(1)], "tok1"))).unwrap();
        h.batches.recv().await.unwrap();

        let (_outstanding, _respond) = h.next_call().await;
        h.stream.stop().unwrap();

        assert!(h.stream.settings().from().is_end());
        assert!(h.saved().from().is_end());

        let _resumed = h.stream.resume().unwrap();
        let (request, _respond) = h.next_call().await;
        assert!(request.from.is_end());
    }

    #[tokio::test(start_paused = true)]
    async fn test_most_recent_generation_wins() {
        let mut h = Harness::new();

        let stale_first = h.stream.resume().unwrap();
        let (_stale_request, stale_respond) = h.next_call().await;

        h.stream.stop().unwrap();
        let first = h.stream.resume().unwrap();
        let (request, respond) = h.next_call().await;
        assert!(request.from.is_end());

        stale_respond
            .send(Ok(EventChunk::new(vec![event(99)], "stale")))
            .unwrap();
        assert!(matches!(stale_first.await, Err(StreamError::Interrupted)));
        assert!(h.stream.settings().from().is_end());

        respond.send(Ok(EventChunk::new(vec![event(1)], "fresh"))).unwrap();
        assert_eq!(first.await.unwrap().end, StreamToken::new("fresh"));

        let batch = h.batches.recv().await.unwrap();
        assert_eq!(batch.events, vec![event(1)]);
        assert_eq!(h.stream.settings().from(), &StreamToken::new("fresh"));
        assert!(h.no_batch_within(Duration::from_secs(1)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_continues_from_saved_cursor() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(
                SETTINGS_KEY,
                bytes::Bytes::from_static(
                    br#"{"from":"tok42","limit":10,"shouldPoll":true,"isActive":true}"#,
                ),
            )
            .unwrap();

        let mut h = Harness::with_store(store);
        assert!(!h.stream.is_active());

        let _first = h.stream.resume().expect("restored stream is idle");
        let (request, _respond) = h.next_call().await;
        assert_eq!(request.from, StreamToken::new("tok42"));
        assert_eq!(request.limit, Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_from_file_store_after_pause() {
        let dir = tempfile::tempdir().unwrap();

        let mut h = Harness::with_store(Arc::new(FileStore::new(dir.path())));
        let _first = h.stream.resume().unwrap();
        let (_request, respond) = h.next_call().await;
        respond.send(Ok(EventChunk::new(vec![event(1)], "tok1"))).unwrap();
        h.batches.recv().await.unwrap();

        let (_outstanding, _respond) = h.next_call().await;
        h.stream.pause().unwrap();
        drop(h);

        let mut restored = Harness::with_store(Arc::new(FileStore::new(dir.path())));
        assert!(!restored.stream.is_active());

        let _first = restored.stream.resume().unwrap();
        let (request, _respond) = restored.next_call().await;
        assert_eq!(request.from, StreamToken::new("tok1"));
    }

    #[test]
    fn test_restore_rejects_corrupt_record() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(SETTINGS_KEY, bytes::Bytes::from_static(b"not json"))
            .unwrap();

        let (calls, _rx) = mpsc::unbounded_channel();
        let (handler, _batches) = ChannelHandler::new();
        let result = EventStream::restore(
            Arc::new(ScriptedSource { calls }),
            Arc::new(handler),
            store,
            StreamConfig::default(),
        );

        assert!(matches!(result, Err(StreamError::Codec(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounds_are_sent_with_each_request() {
        let mut h = Harness::new();
        h.stream.set_bounds(Some("tok100".into()), Some(5));

        let _first = h.stream.resume().unwrap();
        let (request, respond) = h.next_call().await;
        assert_eq!(request.to, Some(StreamToken::new("tok100")));
        assert_eq!(request.limit, Some(5));

        respond.send(Ok(EventChunk::new(Vec::new(), "tok1"))).unwrap();
        let (request, _respond) = h.next_call().await;
        assert_eq!(request.from, StreamToken::new("tok1"));
        assert_eq!(request.limit, Some(5));
    }
}
