//! Metrics instrumentation for the poll loop.
//!
//! Uses the `metrics` facade; nothing is recorded unless the embedding
//! application installs a recorder.

use metrics::{counter, gauge};

/// Metric names.
pub mod names {
    pub const POLLS_TOTAL: &str = "evstream_polls_total";
    pub const EVENTS_TOTAL: &str = "evstream_events_total";
    pub const STALE_RESPONSES_TOTAL: &str = "evstream_stale_responses_total";
    pub const STREAM_ACTIVE: &str = "evstream_stream_active";
}

/// Describe the stream metrics to the installed recorder.
pub fn describe_metrics() {
    metrics::describe_counter!(
        names::POLLS_TOTAL,
        "Completed long-poll requests by outcome"
    );
    metrics::describe_counter!(names::EVENTS_TOTAL, "Events delivered to the handler");
    metrics::describe_counter!(
        names::STALE_RESPONSES_TOTAL,
        "Poll outcomes dropped because the loop was interrupted"
    );
    metrics::describe_gauge!(names::STREAM_ACTIVE, "1 while a poll loop is live");
}

/// Record a completed poll.
pub fn record_poll(outcome: &'static str) {
    counter!(names::POLLS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record delivered events.
pub fn record_events(count: usize) {
    counter!(names::EVENTS_TOTAL).increment(count as u64);
}

/// Record a dropped stale outcome.
pub fn record_stale() {
    counter!(names::STALE_RESPONSES_TOTAL).increment(1);
}

/// Update the active gauge.
pub fn set_active(active: bool) {
    gauge!(names::STREAM_ACTIVE).set(if active { 1.0 } else { 0.0 });
}
