//! Client configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (EVSTREAM_*)
//! - TOML configuration file
//! - `--config` on the command line

use anyhow::{Context, Result};
use evstream_core::StreamConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server connection.
    #[serde(default)]
    pub server: ServerConfig,

    /// Poll loop settings.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Where the stream position is saved.
    #[serde(default)]
    pub store: StoreConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Access token passed through on every request.
    #[serde(default = "default_access_token")]
    pub access_token: Option<String>,

    /// Extra client-side wait on top of the long-poll timeout, in milliseconds.
    #[serde(default = "default_request_grace")]
    pub request_grace_ms: u64,
}

/// Settings store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the saved stream settings. `~` is expanded.
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_base_url() -> String {
    std::env::var("EVSTREAM_BASE_URL").unwrap_or_else(|_| "http://localhost:8008".to_string())
}

fn default_access_token() -> Option<String> {
    std::env::var("EVSTREAM_ACCESS_TOKEN").ok()
}

fn default_request_grace() -> u64 {
    10_000 // 10 seconds
}

fn default_store_dir() -> String {
    "~/.local/share/evstream".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            stream: StreamConfig::default(),
            store: StoreConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: default_access_token(),
            request_grace_ms: default_request_grace(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, the default locations, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let config_paths = ["evstream.toml", "~/.config/evstream/evstream.toml"];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// The settings store directory with `~` expanded.
    #[must_use]
    pub fn store_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store.dir).as_ref())
    }

    /// Client-side grace period as a duration.
    #[must_use]
    pub fn request_grace(&self) -> Duration {
        Duration::from_millis(self.server.request_grace_ms)
    }
}
