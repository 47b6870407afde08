//! Projection contract supplied by callers.

use std::sync::Arc;

use uuid::Uuid;

use crate::event::Event;

/// A read-model record hydrated from one or more event streams.
///
/// The engine clones projections to materialize dependent fields and never
/// touches the caller's instances. Identity is `projection_id`, so value
/// types compare correctly.
pub trait Projection: Clone + Send + Sync + 'static {
    /// Stable unique identifier of this projection.
    fn projection_id(&self) -> Uuid;
}

/// Pure event-application capability for one projection type.
///
/// Takes a projection by value and returns the updated projection.
pub type EventApplier<P> = Arc<dyn Fn(P, &Event) -> P + Send + Sync>;
