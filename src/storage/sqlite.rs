//! SQLite implementation of the local event store.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::event::Event;
use crate::interfaces::event_store::{LocalEventStore, Result, StorageError};

use super::schema::{Events, CREATE_EVENTS_INDEX, CREATE_EVENTS_TABLE};

/// Render a timestamp in the fixed-width form stored in the `timestamp` column.
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidTimestamp(format!("{raw}: {e}")))
}

/// SQLite implementation of LocalEventStore.
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Create a new SQLite event store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_EVENTS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_EVENTS_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert events in one transaction.
    pub async fn append(&self, events: &[Event]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for event in events {
            let query = Query::insert()
                .into_table(Events::Table)
                .columns([
                    Events::Id,
                    Events::AggregateRootId,
                    Events::Timestamp,
                    Events::CommandName,
                    Events::Payload,
                ])
                .values_panic([
                    event.id.to_string().into(),
                    event.aggregate_root_id.to_string().into(),
                    encode_timestamp(&event.timestamp).into(),
                    event.command_name.clone().into(),
                    serde_json::to_string(&event.payload)?.into(),
                ])
                .to_string(SqliteQueryBuilder);

            sqlx::query(&query).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Render the lookup for `aggregate_ids`, optionally capped at `point_in_time`.
    ///
    /// The sea-query statement is not `Send`; it must not live across an await.
    fn select_query(aggregate_ids: &[Uuid], point_in_time: Option<DateTime<Utc>>) -> String {
        let ids: Vec<String> = aggregate_ids.iter().map(Uuid::to_string).collect();

        let mut select = Query::select();
        select
            .columns([
                Events::Id,
                Events::AggregateRootId,
                Events::Timestamp,
                Events::CommandName,
                Events::Payload,
            ])
            .from(Events::Table)
            .and_where(Expr::col(Events::AggregateRootId).is_in(ids));

        if let Some(cutoff) = point_in_time {
            select.and_where(Expr::col(Events::Timestamp).lte(encode_timestamp(&cutoff)));
        }

        select
            .order_by(Events::Timestamp, Order::Asc)
            .to_string(SqliteQueryBuilder)
    }
}

#[async_trait]
impl LocalEventStore for SqliteEventStore {
    async fn query_events(
        &self,
        aggregate_ids: &[Uuid],
        point_in_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>> {
        if aggregate_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = Self::select_query(aggregate_ids, point_in_time);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        debug!(
            ids = aggregate_ids.len(),
            rows = rows.len(),
            "SQLite event query completed"
        );

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let root: String = row.get("aggregate_root_id");
            let timestamp: String = row.get("timestamp");
            let payload: String = row.get("payload");
            events.push(Event {
                id: Uuid::parse_str(&id)?,
                aggregate_root_id: Uuid::parse_str(&root)?,
                timestamp: decode_timestamp(&timestamp)?,
                command_name: row.get("command_name"),
                payload: serde_json::from_str(&payload)?,
            });
        }

        Ok(events)
    }
}
