//! Core error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the link store.
#[derive(Error, Debug)]
pub enum CoreError {
    /// SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Database file could not be opened
    #[error("failed to open link store '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Stored schema does not match this build
    #[error("link store schema version mismatch: expected {expected}, found {found}")]
    SchemaVersion { expected: String, found: String },

    /// A stored link carries an unknown scope
    #[error("connection {id} has unknown scope '{scope}'")]
    UnknownScope { id: i64, scope: String },

    /// A stored link carries unparseable type tags
    #[error("connection {id} has invalid type tags: {source}")]
    InvalidLinkTypes {
        id: i64,
        #[source]
        source: serde_json::Error,
    },
}

impl CoreError {
    /// Create an Open error.
    pub fn open(path: impl Into<PathBuf>, source: rusqlite::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::SchemaVersion {
            expected: "1.0".into(),
            found: "0.9".into(),
        };
        assert!(err.to_string().contains("expected 1.0"));
        assert!(err.to_string().contains("found 0.9"));

        let err = CoreError::UnknownScope {
            id: 7,
            scope: "portal".into(),
        };
        assert!(err.to_string().contains("portal"));
    }
}
