use std::path::PathBuf;

use thiserror::Error;

/// A3S Build error types
#[derive(Error, Debug)]
pub enum BuildError {
    /// Build context directory missing or not a directory
    #[error("Build context not found: {}", .0.display())]
    ContextNotFound(PathBuf),

    /// Failure while walking the context or reading a file from it
    #[error("Failed to read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive stream write or finalize failure
    #[error("Archive write error: {0}")]
    WriteError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl BuildError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// The underlying I/O error kind, if this error came from the filesystem.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            BuildError::ReadError { source, .. } => Some(source.kind()),
            BuildError::IoError(e) => Some(e.kind()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BuildError {
    fn from(err: serde_json::Error) -> Self {
        BuildError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for BuildError {
    fn from(err: serde_yaml::Error) -> Self {
        BuildError::SerializationError(err.to_string())
    }
}

/// Result type alias for A3S Build operations
pub type Result<T> = std::result::Result<T, BuildError>;
