//! Mock remote event source for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::event::{Event, ForeignEventsRequest};
use crate::interfaces::remote_source::{RemoteEventSource, Result, TransportError};
use crate::services::ForeignEventsService;

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: String,
    pub request: ForeignEventsRequest,
}

/// Routes endpoints to in-process [`ForeignEventsService`] instances.
///
/// Stands in for a fleet of remote services: each registered endpoint
/// answers from its own local store. Calls are recorded, endpoints can be
/// made to fail or to respond slowly, and unknown endpoints are
/// unreachable.
#[derive(Default)]
pub struct MockRemoteSource {
    services: RwLock<HashMap<String, Arc<ForeignEventsService>>>,
    failing: RwLock<HashSet<String>>,
    malformed: RwLock<HashSet<String>>,
    delays: RwLock<HashMap<String, Duration>>,
    calls: RwLock<Vec<RecordedCall>>,
}

impl MockRemoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer calls to `endpoint` from `service`.
    pub async fn register(&self, endpoint: impl Into<String>, service: Arc<ForeignEventsService>) {
        self.services.write().await.insert(endpoint.into(), service);
    }

    /// Make `endpoint` return HTTP 503.
    pub async fn set_failing(&self, endpoint: &str, fail: bool) {
        let mut failing = self.failing.write().await;
        if fail {
            failing.insert(endpoint.to_string());
        } else {
            failing.remove(endpoint);
        }
    }

    /// Make `endpoint` return a body that does not decode.
    pub async fn set_malformed(&self, endpoint: &str, malformed: bool) {
        let mut set = self.malformed.write().await;
        if malformed {
            set.insert(endpoint.to_string());
        } else {
            set.remove(endpoint);
        }
    }

    /// Delay every response from `endpoint`.
    pub async fn set_delay(&self, endpoint: &str, delay: Duration) {
        self.delays.write().await.insert(endpoint.to_string(), delay);
    }

    /// Every call received so far, oldest first.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Calls received by one endpoint.
    pub async fn calls_to(&self, endpoint: &str) -> Vec<RecordedCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RemoteEventSource for MockRemoteSource {
    async fn fetch_events(
        &self,
        endpoint: &str,
        request: &ForeignEventsRequest,
    ) -> Result<Vec<Event>> {
        self.calls.write().await.push(RecordedCall {
            endpoint: endpoint.to_string(),
            request: request.clone(),
        });

        let delay = self.delays.read().await.get(endpoint).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().await.contains(endpoint) {
            return Err(TransportError::Status {
                endpoint: endpoint.to_string(),
                status: 503,
                body: "mock endpoint failure".to_string(),
            });
        }

        if self.malformed.read().await.contains(endpoint) {
            return Err(TransportError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: "mock malformed body".to_string(),
            });
        }

        let service = self.services.read().await.get(endpoint).cloned();
        let service = service.ok_or_else(|| TransportError::Unreachable {
            endpoint: endpoint.to_string(),
            message: "no service registered".to_string(),
        })?;

        service
            .handle(request)
            .await
            .map_err(|e| TransportError::Status {
                endpoint: endpoint.to_string(),
                status: 500,
                body: e.to_string(),
            })
    }
}
