//! Event model shared by the local store and the remote wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored domain event.
///
/// Local store rows and remote endpoint responses have the same shape, so a
/// single type serves both. Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique event id.
    pub id: Uuid,
    /// Aggregate the event belongs to.
    pub aggregate_root_id: Uuid,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Name of the command that produced the event.
    pub command_name: String,
    /// Opaque event body.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Event {
    /// Create an event with a fresh id.
    pub fn new(
        aggregate_root_id: Uuid,
        timestamp: DateTime<Utc>,
        command_name: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            aggregate_root_id,
            timestamp,
            command_name: command_name.into(),
            payload,
        }
    }

    /// Whether the event falls inside an inclusive point-in-time cutoff.
    ///
    /// No cutoff means every event is visible.
    pub fn visible_at(&self, point_in_time: Option<DateTime<Utc>>) -> bool {
        point_in_time.map_or(true, |cutoff| self.timestamp <= cutoff)
    }
}

/// Body of a batch request to a remote event endpoint.
///
/// `pointInTime` is always serialized; `null` means no cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignEventsRequest {
    pub foreign_ids: Vec<Uuid>,
    #[serde(default)]
    pub point_in_time: Option<DateTime<Utc>>,
}
