//! Application configuration.
//!
//! Aggregates configuration from all modules into a single config struct
//! that can be loaded from YAML files or environment variables.

mod remote;
mod storage;

pub use remote::{HttpTransportConfig, RemoteEndpointConfig};
pub use storage::StorageConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "HYDRATE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "HYDRATE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "HYDRATE_LOG";

/// Default ceiling on resolution rounds.
pub const DEFAULT_MAX_ROUNDS: u32 = 32;

use serde::Deserialize;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown remote service: {0}")]
    UnknownRemote(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Resolution engine tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of fetch rounds (round 0 included).
    pub max_rounds: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

/// Main hydration configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HydrationConfig {
    /// Local event store.
    pub storage: StorageConfig,
    /// HTTP transport for remote event endpoints.
    pub transport: HttpTransportConfig,
    /// Remote services by name.
    pub remotes: Vec<RemoteEndpointConfig>,
    /// Resolution engine tuning.
    pub engine: EngineConfig,
}

impl HydrationConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Endpoint URL of the remote service called `name`.
    pub fn remote_url(&self, name: &str) -> Result<&str, ConfigError> {
        self.remotes
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.url.as_str())
            .ok_or_else(|| ConfigError::UnknownRemote(name.to_string()))
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }
}
