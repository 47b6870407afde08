//! Mock LocalEventStore implementation for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::event::Event;
use crate::interfaces::event_store::{LocalEventStore, Result, StorageError};

/// One recorded `query_events` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub aggregate_ids: Vec<Uuid>,
    pub point_in_time: Option<DateTime<Utc>>,
}

/// Mock event store that keeps events in memory, keyed by aggregate root.
///
/// Every query is recorded so tests can assert how many round trips the
/// engine made and which ids it asked for.
#[derive(Default)]
pub struct MockEventStore {
    events: RwLock<HashMap<Uuid, Vec<Event>>>,
    queries: RwLock<Vec<RecordedQuery>>,
    fail_on_query: RwLock<bool>,
}

impl MockEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append events, grouping them by their aggregate root id.
    pub async fn add(&self, events: impl IntoIterator<Item = Event>) {
        let mut store = self.events.write().await;
        for event in events {
            store.entry(event.aggregate_root_id).or_default().push(event);
        }
    }

    pub async fn set_fail_on_query(&self, fail: bool) {
        *self.fail_on_query.write().await = fail;
    }

    /// Every query received so far, oldest first.
    pub async fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.read().await.clone()
    }

    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }
}

#[async_trait]
impl LocalEventStore for MockEventStore {
    async fn query_events(
        &self,
        aggregate_ids: &[Uuid],
        point_in_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>> {
        self.queries.write().await.push(RecordedQuery {
            aggregate_ids: aggregate_ids.to_vec(),
            point_in_time,
        });

        if *self.fail_on_query.read().await {
            return Err(StorageError::Unavailable("mock store failure".to_string()));
        }

        let store = self.events.read().await;
        let mut seen = std::collections::HashSet::new();
        let mut events: Vec<Event> = aggregate_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| store.get(id))
            .flatten()
            .filter(|e| e.visible_at(point_in_time))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}
