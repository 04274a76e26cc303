//! HTTP long-poll event source.
//!
//! This module provides an `EventSource` that polls the client-server
//! `/events` endpoint using reqwest.

use async_trait::async_trait;
use bytes::BytesMut;
use evstream_protocol::codec::{self, ProtocolError, MAX_BODY_SIZE};
use evstream_protocol::EventChunk;
use std::time::Duration;
use tracing::{debug, trace};

use crate::traits::{EventSource, PollRequest, TransportError};

/// Path prefix of the client API.
pub const API_PREFIX: &str = "/_matrix/client/api/v1";

/// HTTP event source configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the server, without the API prefix.
    pub base_url: String,
    /// Access token appended to every request, if any.
    pub access_token: Option<String>,
    /// Extra time allowed on top of the long-poll timeout before the client
    /// gives up on a request.
    pub request_grace: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8008".to_string(),
            access_token: None,
            request_grace: Duration::from_secs(10),
        }
    }
}

/// Long-poll event source over HTTP.
pub struct HttpEventSource {
    client: reqwest::Client,
    events_url: String,
    config: HttpConfig,
}

impl HttpEventSource {
    /// Create a new HTTP event source.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to build HTTP client: {}", e)))?;

        let events_url = format!(
            "{}{}/events",
            config.base_url.trim_end_matches('/'),
            API_PREFIX
        );
        debug!(url = %events_url, "HTTP event source ready");

        Ok(Self {
            client,
            events_url,
            config,
        })
    }

    /// Get the URL polled for events.
    #[must_use]
    pub fn events_url(&self) -> &str {
        &self.events_url
    }

    fn query(&self, request: &PollRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("from", request.from.to_string()),
            ("timeout", request.timeout_ms().to_string()),
        ];
        if let Some(to) = &request.to {
            query.push(("to", to.to_string()));
        }
        if let Some(limit) = request.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(token) = &self.config.access_token {
            query.push(("access_token", token.clone()));
        }
        query
    }
}

fn map_request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(e.to_string())
    }
}

/// Read the response body, giving up as soon as it outgrows `MAX_BODY_SIZE`.
async fn read_body(mut response: reqwest::Response) -> Result<BytesMut, TransportError> {
    if let Some(length) = response.content_length() {
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        if length > MAX_BODY_SIZE {
            return Err(ProtocolError::BodyTooLarge(length).into());
        }
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response.chunk().await.map_err(map_request_error)? {
        let size = body.len() + chunk.len();
        if size > MAX_BODY_SIZE {
            return Err(ProtocolError::BodyTooLarge(size).into());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn poll(&self, request: &PollRequest) -> Result<EventChunk, TransportError> {
        trace!(from = %request.from, timeout_ms = request.timeout_ms(), "GET events");

        let response = self
            .client
            .get(&self.events_url)
            .query(&self.query(request))
            .timeout(request.timeout + self.config.request_grace)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            // The status decides retry or halt; an unreadable body must not mask it
            let body = match read_body(response).await {
                Ok(body) => String::from_utf8_lossy(&body).into_owned(),
                Err(e) => {
                    debug!(status = status.as_u16(), error = %e, "Dropping error body");
                    String::new()
                }
            };
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = read_body(response).await?;
        Ok(codec::decode_chunk(&body)?)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
