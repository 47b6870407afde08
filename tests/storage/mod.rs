//! Shared storage integration tests.
//!
//! Tests the LocalEventStore interface against all implementations.
//! Each implementation module seeds its store through [`SeedStore`] and runs
//! these test functions.

pub mod local_store_tests;

use async_trait::async_trait;

use evented_hydrate::storage::MockEventStore;
use evented_hydrate::{Event, LocalEventStore};

/// Write access the contract tests need to set up fixtures.
#[async_trait]
pub trait SeedStore: LocalEventStore {
    async fn seed(&self, events: Vec<Event>);
}

#[async_trait]
impl SeedStore for MockEventStore {
    async fn seed(&self, events: Vec<Event>) {
        self.add(events).await;
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl SeedStore for evented_hydrate::storage::SqliteEventStore {
    async fn seed(&self, events: Vec<Event>) {
        self.append(&events).await.expect("append should succeed");
    }
}
