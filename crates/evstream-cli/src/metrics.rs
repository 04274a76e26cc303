//! Prometheus export of the stream metrics.
//!
//! The core records through the `metrics` facade; this installs the recorder.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    evstream_core::metrics::describe_metrics();

    info!("Metrics server listening on {}", addr);
    Ok(())
}
