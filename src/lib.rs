//! Evented Hydrate - foreign event resolution for CQRS/ES read models
//!
//! Given a batch of projections holding foreign ids that point at
//! aggregates in the local event store or in other services, discovers,
//! fetches, deduplicates and chronologically merges every event needed to
//! rehydrate each projection, including events only reachable after
//! earlier events have been applied.

pub mod clients;
pub mod config;
pub mod error;
pub mod event;
pub mod fetch;
pub mod interfaces;
pub mod requester;
pub mod selector;
pub mod services;
pub mod storage;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod utils;

pub use error::{HydrationError, Result};
pub use event::{Event, ForeignEventsRequest};
pub use interfaces::{EventApplier, LocalEventStore, Projection, RemoteEventSource};
pub use requester::{EventRequester, Target};
pub use selector::{ForeignIdSelector, ResolvedSelector};
pub use services::{get_events, HydrationEngine, ProjectionEvents};
