//! Config loading errors.

use std::path::PathBuf;
use thiserror::Error;

/// What went wrong while reading, writing or checking jumpgate settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Filesystem access to a config file or its directory failed
    #[error("cannot {action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid jumpgate TOML
    #[error("'{}' is not a valid jumpgate config: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot render jumpgate config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("no home directory to hold the global jumpgate config")]
    NoHomeDir,

    /// A setting is out of range
    #[error("setting {key} {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::invalid("route.limit", "must be at least 1");
        assert_eq!(err.to_string(), "setting route.limit must be at least 1");

        let err = ConfigError::io(
            "read",
            "/tmp/jumpgate.toml",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.to_string().starts_with("cannot read '/tmp/jumpgate.toml'"));
    }
}
