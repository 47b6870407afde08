//! Abstract interfaces for hydration collaborators.
//!
//! These traits define the contracts for:
//! - Local event storage (query side)
//! - Remote event endpoints (batch fetch over the wire)
//! - Projections and their event-application capability

pub mod event_store;
pub mod projection;
pub mod remote_source;

pub use event_store::{LocalEventStore, StorageError};
pub use projection::{EventApplier, Projection};
pub use remote_source::{RemoteEventSource, TransportError};
