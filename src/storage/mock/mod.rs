//! Mock storage implementations for testing.

mod event_store;

pub use event_store::{MockEventStore, RecordedQuery};
