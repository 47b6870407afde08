//! Hydration services.

pub mod foreign_events;
pub mod hydration;

pub use foreign_events::{ForeignEventsError, ForeignEventsService};
pub use hydration::{get_events, HydrationEngine, ProjectionEvents};
