//! Storage configuration types.

use serde::Deserialize;

/// Local event store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type: `sqlite` or `memory`.
    #[serde(rename = "type")]
    pub storage_type: String,
    /// SQLite database file path.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: "sqlite".to_string(),
            path: "./data/events.db".to_string(),
        }
    }
}
