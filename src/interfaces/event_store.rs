//! Local event store interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::event::Event;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Query side of the local event store.
///
/// The hydration engine only ever reads; writes belong to the command side
/// and are exposed by the concrete stores for seeding and tests.
///
/// Implementations:
/// - `SqliteEventStore`: SQLite storage
/// - `MockEventStore`: In-memory mock for testing
#[async_trait]
pub trait LocalEventStore: Send + Sync {
    /// Retrieve every event whose aggregate root id is in `aggregate_ids`.
    ///
    /// When `point_in_time` is set only events with
    /// `timestamp <= point_in_time` are returned. An id with no events is
    /// not an error. Order of the returned events is unspecified.
    async fn query_events(
        &self,
        aggregate_ids: &[Uuid],
        point_in_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>>;
}
