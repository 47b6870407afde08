//! Answering side of the batch event endpoint.
//!
//! A service that lets other services hydrate from its aggregates exposes
//! its local store through this handler: decode `{ foreignIds, pointInTime }`,
//! query, reply with a JSON array of events ordered by timestamp.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error};

use crate::event::{Event, ForeignEventsRequest};
use crate::interfaces::{LocalEventStore, StorageError};

/// Errors from the JSON entry point.
#[derive(Debug, thiserror::Error)]
pub enum ForeignEventsError {
    #[error("Invalid request body: {0}")]
    BadRequest(#[source] serde_json::Error),

    #[error("Failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Serves foreign event requests from a local event store.
pub struct ForeignEventsService {
    store: Arc<dyn LocalEventStore>,
}

impl ForeignEventsService {
    pub fn new(store: Arc<dyn LocalEventStore>) -> Self {
        Self { store }
    }

    /// Answer a decoded request.
    ///
    /// Duplicate ids are collapsed. An empty id list returns no events
    /// without touching the store.
    pub async fn handle(&self, request: &ForeignEventsRequest) -> Result<Vec<Event>, StorageError> {
        let ids: Vec<_> = request
            .foreign_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut events = self
            .store
            .query_events(&ids, request.point_in_time)
            .await
            .map_err(|e| {
                error!(ids = ids.len(), error = %e, "Foreign events query failed");
                e
            })?;
        events.sort_by_key(|e| e.timestamp);

        debug!(
            ids = ids.len(),
            events = events.len(),
            point_in_time = ?request.point_in_time,
            "Answered foreign events request"
        );
        Ok(events)
    }

    /// Answer a raw JSON request body with a raw JSON response body.
    pub async fn handle_json(&self, body: &[u8]) -> Result<Vec<u8>, ForeignEventsError> {
        let request: ForeignEventsRequest =
            serde_json::from_slice(body).map_err(ForeignEventsError::BadRequest)?;
        let events = self.handle(&request).await?;
        serde_json::to_vec(&events).map_err(ForeignEventsError::Encode)
    }
}
