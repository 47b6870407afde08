//! Multi-round foreign event resolution.
//!
//! [`HydrationEngine`] collects requesters for a batch of projections and
//! resolves every event needed to rehydrate them:
//!
//! 1. Round 0 evaluates the immediate requesters against the caller's
//!    projections and fetches from every source concurrently.
//! 2. When dependent requesters are registered, each following round
//!    applies the events gathered so far to scratch clones, re-evaluates
//!    the selectors against those clones and fetches whatever ids are new.
//! 3. Resolution stops once a round neither fetches a new id nor attributes
//!    a new event.
//!
//! Any source failure aborts the call. Callers never see a partial result.

mod state;

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, DEFAULT_MAX_ROUNDS};
use crate::error::{HydrationError, Result};
use crate::event::Event;
use crate::fetch::{attribute, collect_ids, fetch_local, fetch_remote, EventGroups};
use crate::interfaces::{EventApplier, LocalEventStore, Projection, RemoteEventSource};
use crate::requester::{EventRequester, Target};
use crate::selector::ResolvedSelector;

use state::RoundState;

/// Ordered, deduplicated events for one projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionEvents {
    pub projection_id: Uuid,
    pub events: Vec<Event>,
}

/// Selectors and wanted ids for one source in one round.
struct SourcePlan<P> {
    target: Target,
    selectors: Vec<ResolvedSelector<P>>,
    ids: BTreeSet<Uuid>,
}

#[derive(Debug, Default)]
struct RoundOutcome {
    fetched_ids: usize,
    attributed: usize,
}

/// Resolves foreign events for a batch of projections.
///
/// Collaborators are injected before requesters are registered; a
/// requester whose target or class needs a missing collaborator is rejected
/// at registration.
///
/// ```ignore
/// let results = HydrationEngine::new(orders)
///     .with_local_store(store)
///     .with_transport(transport)
///     .with_applier(applier)
///     .add_requester(EventRequester::local().required_single(|o| o.customer_id))?
///     .add_requester(EventRequester::remote(url)?.list(|o| o.items.clone()))?
///     .add_dependent_requester(EventRequester::local().single(|o| o.shipment_id))?
///     .get_events(None)
///     .await?;
/// ```
pub struct HydrationEngine<P: Projection> {
    projections: Vec<P>,
    local_store: Option<Arc<dyn LocalEventStore>>,
    transport: Option<Arc<dyn RemoteEventSource>>,
    applier: Option<EventApplier<P>>,
    immediate: Vec<EventRequester<P>>,
    dependent: Vec<EventRequester<P>>,
    /// Remote endpoints in first-registration order; local always ranks first.
    remotes: Vec<String>,
    max_rounds: u32,
}

impl<P: Projection> HydrationEngine<P> {
    /// Start an engine for a projection batch.
    pub fn new(projections: Vec<P>) -> Self {
        Self {
            projections,
            local_store: None,
            transport: None,
            applier: None,
            immediate: Vec::new(),
            dependent: Vec::new(),
            remotes: Vec::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_local_store(mut self, store: Arc<dyn LocalEventStore>) -> Self {
        self.local_store = Some(store);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn RemoteEventSource>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Capability used to materialize dependent fields on scratch copies.
    pub fn with_applier(mut self, applier: EventApplier<P>) -> Self {
        self.applier = Some(applier);
        self
    }

    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.max_rounds = config.max_rounds;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Register a requester evaluated from round 0 onwards.
    pub fn add_requester(mut self, requester: EventRequester<P>) -> Result<Self> {
        self.check_target(requester.target())?;
        self.track_remote(requester.target());
        self.immediate.push(requester);
        Ok(self)
    }

    /// Register a requester whose fields are only populated by applying
    /// previously fetched events.
    pub fn add_dependent_requester(mut self, requester: EventRequester<P>) -> Result<Self> {
        if self.applier.is_none() {
            return Err(HydrationError::configuration(
                "dependent requester registered without an event applier",
            ));
        }
        self.check_target(requester.target())?;
        self.track_remote(requester.target());
        self.dependent.push(requester);
        Ok(self)
    }

    fn check_target(&self, target: &Target) -> Result<()> {
        match target {
            Target::Local if self.local_store.is_none() => Err(HydrationError::configuration(
                "local requester registered without a local event store",
            )),
            Target::Remote(endpoint) if self.transport.is_none() => {
                Err(HydrationError::configuration(format!(
                    "remote requester for {endpoint} registered without a transport"
                )))
            }
            _ => Ok(()),
        }
    }

    fn track_remote(&mut self, target: &Target) {
        if let Target::Remote(endpoint) = target {
            if !self.remotes.contains(endpoint) {
                self.remotes.push(endpoint.clone());
            }
        }
    }

    /// Tie-break rank for events with equal timestamps.
    fn source_rank(&self, target: &Target) -> usize {
        match target {
            Target::Local => 0,
            Target::Remote(endpoint) => self
                .remotes
                .iter()
                .position(|r| r == endpoint)
                .map_or(usize::MAX, |i| i + 1),
        }
    }

    /// Resolve events for every projection in the batch.
    ///
    /// `point_in_time` is an inclusive upper bound on event timestamps,
    /// applied to every source in every round.
    pub async fn get_events(
        &self,
        point_in_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<ProjectionEvents>> {
        self.resolve(point_in_time).await
    }

    /// Like [`get_events`](Self::get_events), abandoning all in-flight
    /// fetches once `cancel` turns `true`.
    pub async fn get_events_until_cancelled(
        &self,
        point_in_time: Option<DateTime<Utc>>,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<Vec<ProjectionEvents>> {
        tokio::select! {
            biased;
            _ = wait_for_cancel(&mut cancel) => {
                warn!(projections = self.projections.len(), "Hydration cancelled");
                Err(HydrationError::Cancelled)
            }
            result = self.resolve(point_in_time) => result,
        }
    }

    async fn resolve(&self, point_in_time: Option<DateTime<Utc>>) -> Result<Vec<ProjectionEvents>> {
        info!(
            projections = self.projections.len(),
            immediate = self.immediate.len(),
            dependent = self.dependent.len(),
            point_in_time = ?point_in_time,
            "Hydration started"
        );

        let mut state = RoundState::default();

        let immediate: Vec<&EventRequester<P>> = self.immediate.iter().collect();
        let plans = self.plan(&immediate, &self.projections);
        self.run_round(&mut state, &plans, &self.projections, point_in_time)
            .await?;
        let mut fetch_rounds: u32 = 1;

        if !self.dependent.is_empty() {
            let every: Vec<&EventRequester<P>> =
                self.immediate.iter().chain(self.dependent.iter()).collect();
            loop {
                let scratch = self.materialize(&state)?;
                let plans = self.plan(&every, &scratch);
                // Only rounds that fetch count toward the limit.
                if !self.pending(&state, &plans).is_empty() {
                    if fetch_rounds >= self.max_rounds {
                        return Err(HydrationError::RoundLimitExceeded(self.max_rounds));
                    }
                    fetch_rounds += 1;
                }
                let outcome = self
                    .run_round(&mut state, &plans, &scratch, point_in_time)
                    .await?;
                if outcome.fetched_ids == 0 && outcome.attributed == 0 {
                    break;
                }
            }
        }

        let results = self.collect_results(&mut state);
        info!(
            rounds = state.round,
            fetch_rounds,
            aggregates = state.fetched_count(),
            projections = results.len(),
            events = results.iter().map(|r| r.events.len()).sum::<usize>(),
            "Hydration completed"
        );
        Ok(results)
    }

    /// Group requester selectors by source and collect the ids they want.
    ///
    /// The nil id is the unset sentinel and is never requested.
    fn plan(&self, requesters: &[&EventRequester<P>], batch: &[P]) -> Vec<SourcePlan<P>> {
        let mut plans: Vec<SourcePlan<P>> = Vec::new();
        for requester in requesters {
            let selectors = requester.all_selectors(batch);
            let mut ids = collect_ids(batch, &selectors);
            ids.remove(&Uuid::nil());

            match plans.iter_mut().find(|p| &p.target == requester.target()) {
                Some(plan) => {
                    plan.selectors.extend(selectors);
                    plan.ids.extend(ids);
                }
                None => plans.push(SourcePlan {
                    target: requester.target().clone(),
                    selectors,
                    ids,
                }),
            }
        }
        plans.sort_by_key(|p| self.source_rank(&p.target));
        plans
    }

    /// Ids each source still has to be asked for.
    fn pending(&self, state: &RoundState, plans: &[SourcePlan<P>]) -> Vec<(Target, BTreeSet<Uuid>)> {
        plans
            .iter()
            .filter_map(|plan| {
                let remainder = state.remainder(&plan.target, &plan.ids);
                (!remainder.is_empty()).then(|| (plan.target.clone(), remainder))
            })
            .collect()
    }

    /// One fetch/merge pass: fetch unfetched ids from every source
    /// concurrently, then attribute against `batch` in source-rank order.
    async fn run_round(
        &self,
        state: &mut RoundState,
        plans: &[SourcePlan<P>],
        batch: &[P],
        point_in_time: Option<DateTime<Utc>>,
    ) -> Result<RoundOutcome> {
        let requests = self.pending(state, plans);

        let mut outcome = RoundOutcome {
            fetched_ids: requests.iter().map(|(_, ids)| ids.len()).sum(),
            attributed: 0,
        };
        debug!(
            round = state.round,
            sources = requests.len(),
            ids = outcome.fetched_ids,
            "Hydration round fetching"
        );

        for (target, requested, groups) in self.fetch_all(requests, point_in_time).await? {
            state.record(target, requested, groups);
        }

        for plan in plans {
            let mut matched = match state.fetched(&plan.target) {
                Some(groups) => attribute(groups, &plan.selectors, batch),
                None => continue,
            };
            let rank = self.source_rank(&plan.target);
            for projection in batch {
                let id = projection.projection_id();
                if let Some(events) = matched.remove(&id) {
                    outcome.attributed += state.merge(id, events, rank);
                }
            }
        }

        debug!(
            round = state.round,
            attributed = outcome.attributed,
            "Hydration round merged"
        );
        state.round += 1;
        Ok(outcome)
    }

    /// Fetch every request concurrently; the first failure aborts the rest.
    async fn fetch_all(
        &self,
        requests: Vec<(Target, BTreeSet<Uuid>)>,
        point_in_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<(Target, BTreeSet<Uuid>, EventGroups)>> {
        let fetches = requests.into_iter().map(|(target, ids)| async move {
            let groups = match &target {
                Target::Local => {
                    let store = self.local_store.as_deref().ok_or_else(|| {
                        HydrationError::configuration("no local event store configured")
                    })?;
                    fetch_local(store, &ids, point_in_time).await?
                }
                Target::Remote(endpoint) => {
                    let transport = self.transport.as_deref().ok_or_else(|| {
                        HydrationError::configuration("no remote transport configured")
                    })?;
                    fetch_remote(transport, endpoint, &ids, point_in_time).await?
                }
            };
            Ok::<_, HydrationError>((target, ids, groups))
        });

        try_join_all(fetches).await
    }

    /// Scratch clones with every accumulated event applied.
    fn materialize(&self, state: &RoundState) -> Result<Vec<P>> {
        let applier = self.applier.as_ref().ok_or_else(|| {
            HydrationError::configuration("dependent resolution needs an event applier")
        })?;

        Ok(self
            .projections
            .iter()
            .map(|projection| match state.log(&projection.projection_id()) {
                Some(log) => log
                    .events()
                    .fold(projection.clone(), |scratch, event| applier(scratch, event)),
                None => projection.clone(),
            })
            .collect())
    }

    /// Final per-projection lists in batch order, skipping empty ones.
    fn collect_results(&self, state: &mut RoundState) -> Vec<ProjectionEvents> {
        let mut emitted = HashSet::new();
        self.projections
            .iter()
            .map(Projection::projection_id)
            .filter(|id| emitted.insert(*id))
            .filter_map(|id| {
                let log = state.take_log(&id)?;
                (!log.is_empty()).then(|| ProjectionEvents {
                    projection_id: id,
                    events: log.into_events(),
                })
            })
            .collect()
    }
}

async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Sender gone without cancelling: never fires.
            std::future::pending::<()>().await;
        }
    }
}

/// Resolve immediate requesters for a batch in one call.
///
/// Shorthand for building a [`HydrationEngine`] without dependent
/// requesters.
pub async fn get_events<P: Projection>(
    projections: Vec<P>,
    local_store: Arc<dyn LocalEventStore>,
    transport: Option<Arc<dyn RemoteEventSource>>,
    requesters: Vec<EventRequester<P>>,
    point_in_time: Option<DateTime<Utc>>,
) -> Result<Vec<ProjectionEvents>> {
    let mut engine = HydrationEngine::new(projections).with_local_store(local_store);
    if let Some(transport) = transport {
        engine = engine.with_transport(transport);
    }
    for requester in requesters {
        engine = engine.add_requester(requester)?;
    }
    engine.get_events(point_in_time).await
}
