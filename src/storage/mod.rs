//! Storage implementations.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::StorageConfig;
use crate::interfaces::LocalEventStore;

pub mod mock;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use mock::MockEventStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEventStore;

/// Initialize the local event store based on configuration.
pub async fn init_local_store(
    config: &StorageConfig,
) -> Result<Arc<dyn LocalEventStore>, Box<dyn std::error::Error + Send + Sync>> {
    info!("Storage: {} at {}", config.storage_type, config.path);

    match config.storage_type.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            if let Some(parent) = std::path::Path::new(&config.path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let pool =
                sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", config.path)).await?;

            let event_store = Arc::new(SqliteEventStore::new(pool));
            event_store.init().await?;

            Ok(event_store)
        }
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => {
            error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err("SQLite feature not enabled".into())
        }
        "memory" => Ok(Arc::new(MockEventStore::new())),
        other => {
            error!("Unknown storage type: {}", other);
            Err(format!("Unknown storage type: {}", other).into())
        }
    }
}
