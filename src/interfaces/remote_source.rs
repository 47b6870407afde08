//! Remote event source interface.

use async_trait::async_trait;

use crate::event::{Event, ForeignEventsRequest};

/// Result type for remote fetches.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised while talking to another service's event endpoint.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Endpoint {endpoint} unreachable: {message}")]
    Unreachable { endpoint: String, message: String },

    #[error("Endpoint {endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl TransportError {
    /// Endpoint the error relates to, when known.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            TransportError::Unreachable { endpoint, .. }
            | TransportError::Status { endpoint, .. }
            | TransportError::MalformedResponse { endpoint, .. } => Some(endpoint),
            TransportError::Client(_) => None,
        }
    }
}

/// Transport used to call the batch event endpoint of another service.
///
/// One call carries every foreign id wanted from that endpoint. Retry
/// policy, if any, lives inside the implementation.
///
/// Implementations:
/// - `HttpEventSource`: JSON over HTTP via reqwest
/// - `MockRemoteSource`: In-process routing for tests
#[async_trait]
pub trait RemoteEventSource: Send + Sync {
    /// POST `request` to `endpoint` and return the flat event list.
    async fn fetch_events(
        &self,
        endpoint: &str,
        request: &ForeignEventsRequest,
    ) -> Result<Vec<Event>>;
}
