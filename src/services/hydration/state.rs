//! Per-call round state.

use std::collections::{BTreeSet, HashMap, HashSet};

use uuid::Uuid;

use crate::event::Event;
use crate::fetch::EventGroups;
use crate::requester::Target;

/// An accumulated event with what is needed to order it deterministically.
#[derive(Debug, Clone)]
struct RankedEvent {
    event: Event,
    source_rank: usize,
    arrival: u64,
}

/// Events attributed to one projection so far.
///
/// Kept sorted by timestamp, then source rank, then arrival.
#[derive(Debug, Default)]
pub(super) struct ProjectionLog {
    events: Vec<RankedEvent>,
    seen: HashSet<Uuid>,
}

impl ProjectionLog {
    pub(super) fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|r| &r.event)
    }

    pub(super) fn into_events(self) -> Vec<Event> {
        self.events.into_iter().map(|r| r.event).collect()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Mutable state of one resolution call. Dropped when the call returns.
#[derive(Debug, Default)]
pub(super) struct RoundState {
    pub(super) round: u32,
    /// Everything fetched so far, per source. Ids that returned no events
    /// are present with an empty group so they are never asked for again.
    fetched: HashMap<Target, EventGroups>,
    logs: HashMap<Uuid, ProjectionLog>,
    arrivals: u64,
}

impl RoundState {
    /// Ids in `wanted` that have not been fetched from `target` yet.
    pub(super) fn remainder(&self, target: &Target, wanted: &BTreeSet<Uuid>) -> BTreeSet<Uuid> {
        match self.fetched.get(target) {
            Some(groups) => wanted
                .iter()
                .filter(|id| !groups.contains_key(id))
                .copied()
                .collect(),
            None => wanted.clone(),
        }
    }

    /// Record a completed fetch.
    pub(super) fn record(&mut self, target: Target, requested: BTreeSet<Uuid>, mut groups: EventGroups) {
        for id in requested {
            groups.entry(id).or_default();
        }
        self.fetched.entry(target).or_default().extend(groups);
    }

    pub(super) fn fetched(&self, target: &Target) -> Option<&EventGroups> {
        self.fetched.get(target)
    }

    /// Number of distinct aggregate ids fetched across all sources.
    pub(super) fn fetched_count(&self) -> usize {
        self.fetched.values().map(HashMap::len).sum()
    }

    /// Merge events into a projection's log, skipping event ids it already
    /// holds. Returns how many events were added.
    pub(super) fn merge(
        &mut self,
        projection_id: Uuid,
        events: Vec<Event>,
        source_rank: usize,
    ) -> usize {
        let log = self.logs.entry(projection_id).or_default();
        let mut added = 0;
        for event in events {
            if !log.seen.insert(event.id) {
                continue;
            }
            self.arrivals += 1;
            log.events.push(RankedEvent {
                event,
                source_rank,
                arrival: self.arrivals,
            });
            added += 1;
        }
        if added > 0 {
            log.events
                .sort_by_key(|r| (r.event.timestamp, r.source_rank, r.arrival));
        }
        added
    }

    pub(super) fn log(&self, projection_id: &Uuid) -> Option<&ProjectionLog> {
        self.logs.get(projection_id)
    }

    pub(super) fn take_log(&mut self, projection_id: &Uuid) -> Option<ProjectionLog> {
        self.logs.remove(projection_id)
    }
}
