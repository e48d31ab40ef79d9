use std::path::PathBuf;
use thiserror::Error;

/// Core error type for fallback resolution.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid matcher pattern {pattern:?} derived from prefix {prefix:?}: {source}")]
    InvalidMatcher {
        prefix: String,
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },

    #[error("Failed to probe {path}: {source}")]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether a later attempt with the same input might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Probe { .. } | Self::Io(_))
    }
}
