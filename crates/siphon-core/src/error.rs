//! Error types for siphon-core

use thiserror::Error;

/// Errors surfaced by file pools and the siphon helper
#[derive(Error, Debug)]
pub enum Error {
    /// The operation needs a container (and sometimes a key) that the path does not name
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The remote call failed: transport, auth, missing object or container, permission
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Reading a source stream or writing a local file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap any backend failure verbatim
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend(Box::new(err))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
