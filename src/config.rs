//! Server configuration.
//!
//! Defaults match the fixed buffer sizes the server was designed around. An
//! optional YAML file named by `BEACON_CONFIG` overrides them; the port always
//! comes from the command line.
//!
//! ```yaml
//! server:
//!   host: 127.0.0.1
//!   backlog: 10
//! limits:
//!   max_body: 4096
//!   chunk_size: 4096
//!   storage_capacity: 4096
//! static_files:
//!   root: ./public
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming an optional YAML configuration file.
pub const CONFIG_ENV: &str = "BEACON_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: Limits,
    pub static_files: StaticConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Pending-connection queue length passed to `listen`.
    pub backlog: u32,
    /// Readiness events drained per wait.
    pub max_events: usize,
}

/// Fixed capacities of every per-connection buffer and of the storage slot.
///
/// Content that does not fit is a protocol error, never a reason to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest request accepted by a single receive.
    pub max_request: usize,
    /// Largest header block, both inbound and for a serialized response head.
    pub max_header: usize,
    /// Largest in-memory body; larger files are streamed.
    pub max_body: usize,
    /// Largest slice of a streamed file moved per write-ready wake.
    pub chunk_size: usize,
    /// Capacity of the `/write` storage slot.
    pub storage_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Directory that static request paths are resolved against.
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),
    #[error("server.max_events must be greater than zero")]
    ZeroEvents,
    #[error("limits.storage_capacity ({storage}) exceeds limits.max_body ({body})")]
    StorageExceedsBody { storage: usize, body: usize },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 12686,
            backlog: 10,
            max_events: 64,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_request: 4096,
            max_header: 1024,
            max_body: 1024,
            chunk_size: 1024,
            storage_capacity: 1024,
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Builds the runtime configuration for `port`.
    ///
    /// Reads the file named by [`CONFIG_ENV`] when it is set, otherwise starts
    /// from the defaults.
    pub fn load(port: u16) -> anyhow::Result<Self> {
        let file = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_with(port, file.as_deref())
    }

    /// Like [`load`](Self::load), with the optional file given directly.
    pub fn load_with(port: u16, file: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.server.port = port;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("parsing YAML configuration")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        let checks = [
            ("max_request", limits.max_request),
            ("max_header", limits.max_header),
            ("max_body", limits.max_body),
            ("chunk_size", limits.chunk_size),
            ("storage_capacity", limits.storage_capacity),
        ];
        if let Some((name, _)) = checks.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroLimit(*name));
        }

        if self.server.max_events == 0 {
            return Err(ConfigError::ZeroEvents);
        }

        if limits.storage_capacity > limits.max_body {
            return Err(ConfigError::StorageExceedsBody {
                storage: limits.storage_capacity,
                body: limits.max_body,
            });
        }

        Ok(())
    }
}
