//! Caller-visible server errors.
//!
//! Only configuration and lifecycle problems surface here. Everything that
//! goes wrong while serving a single request is contained inside the
//! connection task and turned into an HTTP status instead.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Broad category of a [`ServerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad port, bad directory, or a socket that could not be bound.
    InvalidConfiguration,
    /// `start` while running or `stop` while stopped.
    LifecycleMisuse,
}

#[derive(Debug)]
pub enum ServerError {
    /// Port string is not an integer in 1..=65535.
    InvalidPort(String),
    /// Base directory is missing or is not a directory.
    InvalidDirectory(PathBuf),
    AlreadyRunning,
    NotRunning,
    /// The listening socket could not be bound.
    Bind { addr: String, source: io::Error },
}

impl ServerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServerError::InvalidPort(_)
            | ServerError::InvalidDirectory(_)
            | ServerError::Bind { .. } => ErrorKind::InvalidConfiguration,
            ServerError::AlreadyRunning | ServerError::NotRunning => ErrorKind::LifecycleMisuse,
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::InvalidPort(port) => write!(f, "invalid port number: {:?}", port),
            ServerError::InvalidDirectory(dir) => {
                write!(f, "base directory {} does not exist or is not a directory", dir.display())
            }
            ServerError::AlreadyRunning => write!(f, "server is already running"),
            ServerError::NotRunning => write!(f, "server is not running"),
            ServerError::Bind { addr, source } => write!(f, "failed to bind {}: {}", addr, source),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Bind { source, .. } => Some(source),
            _ => None,
        }
    }
}
