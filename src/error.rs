//! Error types for the snapshot engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, sealing, detecting or merging trees.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A non-root entry without a path, or a root with one.
    #[error("Tree invariant violated: {0}")]
    InvariantViolation(String),

    #[error("File has no content hash yet: {0}")]
    Unsealed(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TreeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TreeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced at the application layer (configuration, logging, CLI).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
