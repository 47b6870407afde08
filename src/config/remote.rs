//! Remote service and HTTP transport configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// A named remote service exposing a batch event endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteEndpointConfig {
    /// Service identifier used by requesters.
    pub name: String,
    /// Full URL of the batch event endpoint.
    pub url: String,
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures (0 = none).
    pub max_retries: usize,
    /// First backoff delay in milliseconds.
    pub min_delay_ms: u64,
    /// Backoff delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            min_delay_ms: 100,
            max_delay_ms: 5_000,
            headers: BTreeMap::new(),
        }
    }
}

impl HttpTransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Set the number of retries.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_defaults() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.min_delay(), Duration::from_millis(100));
        assert_eq!(config.max_delay(), Duration::from_secs(5));
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_transport_builder() {
        let config = HttpTransportConfig::default()
            .with_timeout(Duration::from_secs(60))
            .with_max_retries(0)
            .with_header("Authorization", "Bearer token");

        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.headers.get("Authorization").unwrap(), "Bearer token");
    }
}
