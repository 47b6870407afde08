//! HTTP remote event source.
//!
//! POSTs `{ "foreignIds": [...], "pointInTime": ... }` to another service's
//! batch event endpoint and decodes the JSON array of events it returns.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, warn};

use crate::config::HttpTransportConfig;
use crate::event::{Event, ForeignEventsRequest};
use crate::interfaces::remote_source::{RemoteEventSource, Result, TransportError};

/// Remote event source over JSON/HTTP.
///
/// Transient failures (connect errors, timeouts, 429 and 5xx) are retried
/// with exponential backoff; everything else fails on the first attempt.
pub struct HttpEventSource {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpEventSource {
    /// Create a new HTTP event source with the given configuration.
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Backoff configuration for retries.
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.min_delay())
            .with_max_delay(self.config.max_delay())
            .with_max_times(self.config.max_retries)
            .with_jitter()
    }

    /// Determine if an HTTP status code is retryable.
    fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn is_retryable(err: &TransportError) -> bool {
        match err {
            TransportError::Unreachable { .. } => true,
            TransportError::Status { status, .. } => StatusCode::from_u16(*status)
                .map(Self::is_retryable_status)
                .unwrap_or(false),
            TransportError::MalformedResponse { .. } | TransportError::Client(_) => false,
        }
    }

    /// One POST to the endpoint, no retry.
    async fn post_once(&self, endpoint: &str, request: &ForeignEventsRequest) -> Result<Vec<Event>> {
        let mut builder = self.client.post(endpoint).json(request);
        for (key, value) in &self.config.headers {
            builder = builder.header(key, value);
        }

        let response = builder.send().await.map_err(|e| TransportError::Unreachable {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| TransportError::Unreachable {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_slice::<Vec<Event>>(&bytes).map_err(|e| {
            TransportError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl RemoteEventSource for HttpEventSource {
    async fn fetch_events(
        &self,
        endpoint: &str,
        request: &ForeignEventsRequest,
    ) -> Result<Vec<Event>> {
        let result = (|| async { self.post_once(endpoint, request).await })
            .retry(self.backoff())
            .when(Self::is_retryable)
            .notify(|err: &TransportError, delay: Duration| {
                warn!(
                    endpoint = %endpoint,
                    error = %err,
                    retry_in = ?delay,
                    "Remote event fetch failed, retrying"
                );
            })
            .await;

        match &result {
            Ok(events) => debug!(
                endpoint = %endpoint,
                foreign_ids = request.foreign_ids.len(),
                events = events.len(),
                "Remote event fetch completed"
            ),
            Err(e) => error!(endpoint = %endpoint, error = %e, "Remote event fetch failed"),
        }

        result
    }
}
