use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

/// Publisher configuration. Loading this from a file or CLI flags is the
/// embedding application's concern; every field carries a serde default so
/// partial documents deserialize cleanly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Aggregator endpoint. An empty uri disables publishing: `start()` warns
    /// and the registry only accumulates in memory.
    #[serde(alias = "endpoint")]
    pub uri: String,
    /// Tags applied to every published measurement.
    pub common_tags: HashMap<String, String>,
    /// Milliseconds between send cycles.
    pub send_interval_millis: u64,
    /// Maximum measurements per POST.
    pub batch_size: usize,
    pub connect_timeout_seconds: u64,
    pub read_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uri: String::new(),
            common_tags: HashMap::new(),
            send_interval_millis: 5000,
            batch_size: 10_000,
            connect_timeout_seconds: 1,
            read_timeout_seconds: 2,
        }
    }
}

impl Config {
    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_millis)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.uri.is_empty());
        assert_eq!(config.send_interval(), Duration::from_secs(5));
        assert_eq!(config.batch_size, 10_000);
        assert_eq!(config.connect_timeout(), Duration::from_secs(1));
        assert_eq!(config.read_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn deserializes_camel_case() {
        let config: Config = serde_json::from_str(
            r#"{
                "uri": "http://localhost:7101/api/v1/publish",
                "commonTags": {"nf.app": "www", "nf.region": "us-east-1"},
                "sendIntervalMillis": 1000,
                "batchSize": 100,
                "readTimeoutSeconds": 5
            }"#,
        )
        .unwrap();
        assert_eq!(config.uri, "http://localhost:7101/api/v1/publish");
        assert_eq!(config.common_tags.len(), 2);
        assert_eq!(config.send_interval(), Duration::from_secs(1));
        assert_eq!(config.batch_size, 100);
        // absent field falls back to its default
        assert_eq!(config.connect_timeout(), Duration::from_secs(1));
        assert_eq!(config.read_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn endpoint_alias() {
        let config: Config =
            serde_json::from_str(r#"{"endpoint": "http://atlas:7101/publish"}"#).unwrap();
        assert_eq!(config.uri, "http://atlas:7101/publish");
    }
}
