//! Configuration loading
//!
//! Settings resolve in priority order: command-line argument, environment
//! variable, TOML config file, compiled default. The binary applies the
//! CLI/env layer; this module owns the file and default layers.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file path.
pub const CONFIG_PATH_ENV: &str = "JOCKEY_CONFIG";

/// Default config file location relative to the working directory.
const DEFAULT_CONFIG_FILE: &str = "jockey.toml";

fn default_port() -> u16 {
    8080
}

fn default_node_url() -> String {
    "http://localhost:2333".to_string()
}

fn default_presence_interval_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Controller configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP port for the command ingress and liveness endpoints
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the audio node's control API
    #[serde(default = "default_node_url")]
    pub node_url: String,

    /// Shared password sent to the audio node, if it requires one
    #[serde(default)]
    pub node_password: Option<String>,

    /// Base URL of the gateway's callback endpoint for asynchronous
    /// notifications and presence updates. Without it, notifications
    /// are logged and dropped.
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Interval between presence re-assertions
    #[serde(default = "default_presence_interval_secs")]
    pub presence_interval_secs: u64,

    /// Bound on how long a room connect may take before it is reported
    /// as a timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            node_url: default_node_url(),
            node_password: None,
            gateway_url: None,
            presence_interval_secs: default_presence_interval_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Resolution order for the file itself: explicit `path` argument,
    /// `JOCKEY_CONFIG` environment variable, `jockey.toml` in the working
    /// directory. A missing file yields compiled defaults; a present but
    /// malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate: Option<PathBuf> = match path {
            Some(p) => Some(p.to_path_buf()),
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(p) => Some(PathBuf::from(p)),
                Err(_) => {
                    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                    default.exists().then_some(default)
                }
            },
        };

        let Some(file) = candidate else {
            debug!("No config file found, using defaults");
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(&file).map_err(|e| {
            Error::Config(format!("Cannot read {}: {}", file.display(), e))
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Invalid config {}: {}", file.display(), e))
        })?;

        debug!("Loaded config from {}", file.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.node_url, "http://localhost:2333");
        assert!(config.gateway_url.is_none());
        assert_eq!(config.presence_interval_secs, 60);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            port = 9090
            gateway_url = "http://localhost:4000"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.gateway_url.as_deref(), Some("http://localhost:4000"));
        assert_eq!(config.node_url, "http://localhost:2333");
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let result = toml::from_str::<Config>("port = \"not a number\"");
        assert!(result.is_err());
    }
}
