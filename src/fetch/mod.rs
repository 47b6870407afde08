//! Fetch primitives.
//!
//! Two ways to get events for a set of foreign ids, both returning events
//! grouped by aggregate root id:
//! - [`fetch_local`]: one query against the local event store
//! - [`fetch_remote`]: one batch call per remote endpoint
//!
//! [`attribute`] maps those groups back onto the projections whose
//! selectors asked for them.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::event::{Event, ForeignEventsRequest};
use crate::interfaces::{LocalEventStore, Projection, RemoteEventSource, StorageError, TransportError};
use crate::selector::ResolvedSelector;

/// Events grouped by aggregate root id.
pub type EventGroups = HashMap<Uuid, Vec<Event>>;

/// Group a flat event list by aggregate root id, keeping arrival order.
pub fn group_by_aggregate(events: impl IntoIterator<Item = Event>) -> EventGroups {
    let mut groups = EventGroups::new();
    for event in events {
        groups.entry(event.aggregate_root_id).or_default().push(event);
    }
    groups
}

/// Every non-absent id the selectors yield across the batch, deduplicated.
pub fn collect_ids<P: Projection>(
    projections: &[P],
    selectors: &[ResolvedSelector<P>],
) -> BTreeSet<Uuid> {
    selectors
        .iter()
        .flat_map(|selector| projections.iter().filter_map(move |p| selector.select(p)))
        .collect()
}

/// Query the local store for all events of `ids`.
///
/// An empty id set performs no query.
pub async fn fetch_local(
    store: &dyn LocalEventStore,
    ids: &BTreeSet<Uuid>,
    point_in_time: Option<DateTime<Utc>>,
) -> Result<EventGroups, StorageError> {
    if ids.is_empty() {
        return Ok(EventGroups::new());
    }

    let ids: Vec<Uuid> = ids.iter().copied().collect();
    let events = store.query_events(&ids, point_in_time).await?;
    debug!(ids = ids.len(), events = events.len(), "Local fetch completed");
    Ok(group_by_aggregate(events))
}

/// Call `endpoint` once with every id in `ids`.
///
/// Events for ids that were not requested, or newer than the cutoff, are
/// dropped so a misbehaving endpoint cannot leak them into a projection.
/// An empty id set performs no call.
pub async fn fetch_remote(
    source: &dyn RemoteEventSource,
    endpoint: &str,
    ids: &BTreeSet<Uuid>,
    point_in_time: Option<DateTime<Utc>>,
) -> Result<EventGroups, TransportError> {
    if ids.is_empty() {
        return Ok(EventGroups::new());
    }

    let request = ForeignEventsRequest {
        foreign_ids: ids.iter().copied().collect(),
        point_in_time,
    };
    let events = source.fetch_events(endpoint, &request).await?;
    let received = events.len();

    let events: Vec<Event> = events
        .into_iter()
        .filter(|e| ids.contains(&e.aggregate_root_id) && e.visible_at(point_in_time))
        .collect();
    if events.len() != received {
        warn!(
            endpoint = %endpoint,
            dropped = received - events.len(),
            "Remote endpoint returned events outside the request"
        );
    }

    debug!(
        endpoint = %endpoint,
        ids = ids.len(),
        events = events.len(),
        "Remote fetch completed"
    );
    Ok(group_by_aggregate(events))
}

/// Map event groups back onto projections.
///
/// Each selector is evaluated against each projection; every match unions
/// that aggregate's events into the projection's entry. Projections with no
/// matching events get no entry at all. Events are not deduplicated here.
pub fn attribute<P: Projection>(
    groups: &EventGroups,
    selectors: &[ResolvedSelector<P>],
    projections: &[P],
) -> HashMap<Uuid, Vec<Event>> {
    let mut attributed: HashMap<Uuid, Vec<Event>> = HashMap::new();
    for projection in projections {
        for selector in selectors {
            let Some(events) = selector.select(projection).and_then(|id| groups.get(&id)) else {
                continue;
            };
            if events.is_empty() {
                continue;
            }
            attributed
                .entry(projection.projection_id())
                .or_default()
                .extend(events.iter().cloned());
        }
    }
    attributed
}
