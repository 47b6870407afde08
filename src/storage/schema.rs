//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Events table schema.
#[derive(Iden)]
pub enum Events {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "aggregate_root_id"]
    AggregateRootId,
    #[iden = "timestamp"]
    Timestamp,
    #[iden = "command_name"]
    CommandName,
    #[iden = "payload"]
    Payload,
}

/// SQL for creating the events table.
///
/// `timestamp` holds fixed-width RFC3339 text (nanoseconds, `Z` suffix), so
/// string comparison is chronological.
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id TEXT NOT NULL PRIMARY KEY,
    aggregate_root_id TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    command_name TEXT NOT NULL,
    payload TEXT NOT NULL
)
"#;

/// Index serving the `aggregate_root_id IN (..)` lookup.
pub const CREATE_EVENTS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_events_aggregate_root ON events(aggregate_root_id, timestamp)";
