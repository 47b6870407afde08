//! Remote event source clients.

pub mod http;
pub mod mock;

pub use http::HttpEventSource;
pub use mock::{MockRemoteSource, RecordedCall};
