//! Server configuration.
//!
//! [`ServerConfig`] is the validated pair every `start` needs: a port and a
//! base directory. [`Settings`] is the wider application configuration the
//! binary assembles from an optional YAML file and environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::content::resolver::{ResolutionMode, TraversalPolicy};
use crate::error::ServerError;
use crate::server::pool::WorkerLimit;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Parses a port given as text. Accepts 1..=65535, surrounding whitespace ignored.
///
/// # Example
///
/// ```
/// # use csvpage::config::parse_port;
/// assert_eq!(parse_port(" 8080 ").unwrap(), 8080);
/// assert!(parse_port("0").is_err());
/// assert!(parse_port("http").is_err());
/// ```
pub fn parse_port(port: &str) -> Result<u16, ServerError> {
    match port.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ServerError::InvalidPort(port.to_string())),
        Ok(n) => Ok(n),
    }
}

/// Validated listener configuration. Immutable once a server has started with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub base_directory: PathBuf,
}

impl ServerConfig {
    /// Validates a textual port and a base directory.
    pub fn new(port: &str, base_directory: impl Into<PathBuf>) -> Result<Self, ServerError> {
        let port = parse_port(port)?;
        Self::from_parts(port, base_directory)
    }

    pub fn from_parts(port: u16, base_directory: impl Into<PathBuf>) -> Result<Self, ServerError> {
        if port == 0 {
            return Err(ServerError::InvalidPort(port.to_string()));
        }

        let base_directory = base_directory.into();
        if !base_directory.is_dir() {
            return Err(ServerError::InvalidDirectory(base_directory));
        }

        Ok(Self { port, base_directory })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListenSettings {
    pub port: u16,
    pub base_directory: PathBuf,
    /// Milliseconds a client has to send its request line and headers.
    pub read_timeout_ms: u64,
}

impl ListenSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            base_directory: PathBuf::from("."),
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentSettings {
    pub resolution: ResolutionMode,
    pub traversal: TraversalPolicy,
    /// Fixed seed for reproducible picks. `None` draws fresh entropy per pick.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerSettings {
    /// Maximum concurrent connection tasks, `0` for no limit.
    pub limit: usize,
}

impl WorkerSettings {
    pub fn worker_limit(&self) -> WorkerLimit {
        WorkerLimit::from_count(self.limit)
    }
}

/// Full application settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub server: ListenSettings,
    pub content: ContentSettings,
    pub workers: WorkerSettings,
}

impl Settings {
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("invalid settings document")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read settings file {}", path.display()))?;
        Self::from_yaml(&text)
    }

    /// Reads the optional settings file, then applies `CSVPAGE_PORT`,
    /// `CSVPAGE_DIR` and `CSVPAGE_MODE` from the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(port) = std::env::var("CSVPAGE_PORT") {
            settings.server.port = parse_port(&port)?;
        }
        if let Ok(dir) = std::env::var("CSVPAGE_DIR") {
            settings.server.base_directory = PathBuf::from(dir);
        }
        if let Ok(mode) = std::env::var("CSVPAGE_MODE") {
            settings.content.resolution = mode.parse()?;
        }

        Ok(settings)
    }
}
