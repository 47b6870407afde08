//! Errors surfaced by the hydration engine.

use crate::interfaces::{StorageError, TransportError};

/// Result type for hydration operations.
pub type Result<T> = std::result::Result<T, HydrationError>;

/// Errors returned to callers of the hydration engine.
///
/// Configuration problems are raised when a requester is built or
/// registered. Source failures abort the whole call; no partial result is
/// ever returned.
#[derive(Debug, thiserror::Error)]
pub enum HydrationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Remote fetch failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Local store query failed: {0}")]
    LocalStore(#[from] StorageError),

    #[error("Hydration cancelled")]
    Cancelled,

    #[error("Dependent resolution did not converge within {0} rounds")]
    RoundLimitExceeded(u32),
}

impl HydrationError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        HydrationError::Configuration(message.into())
    }
}
