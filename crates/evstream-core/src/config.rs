//! Poll loop configuration.

use crate::settings::SETTINGS_KEY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stream configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Server-side long-poll wait in milliseconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_ms: u64,

    /// Delay before retrying after a transport error, in milliseconds.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_ms: u64,

    /// Store key the settings record is persisted under.
    #[serde(default = "default_settings_key")]
    pub settings_key: String,
}

fn default_poll_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_error_backoff() -> u64 {
    5_000 // 5 seconds
}

fn default_settings_key() -> String {
    SETTINGS_KEY.to_string()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout(),
            error_backoff_ms: default_error_backoff(),
            settings_key: default_settings_key(),
        }
    }
}

impl StreamConfig {
    /// Long-poll wait as a duration.
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Error backoff as a duration.
    #[must_use]
    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.poll_timeout(), Duration::from_secs(30));
        assert_eq!(config.error_backoff(), Duration::from_secs(5));
        assert_eq!(config.settings_key, "streamSettings");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: StreamConfig = serde_json::from_str(r#"{"error_backoff_ms": 250}"#).unwrap();
        assert_eq!(config.error_backoff(), Duration::from_millis(250));
        assert_eq!(config.poll_timeout_ms, 30_000);
    }
}
