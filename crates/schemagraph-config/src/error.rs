//! Errors reported while reading, writing or checking configuration.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The file operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Read,
    Write,
    CreateDir,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileAction::Read => "read",
            FileAction::Write => "write",
            FileAction::CreateDir => "create directory",
        })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file or directory could not be accessed
    #[error("cannot {action} {}: {source}", path.display())]
    Io {
        action: FileAction,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A config file is not valid TOML for [`crate::SchemaGraphConfig`]
    #[error("{} is not a valid config file: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot encode config as TOML: {0}")]
    Encode(#[from] toml::ser::Error),

    /// A setting is out of range; `key` is its dotted TOML path
    #[error("{key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub(crate) fn io(action: FileAction, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Dotted key of the offending setting, for `InvalidValue`
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { key, .. } => Some(key),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_names_key() {
        let err = ConfigError::invalid_value("logging.level", "unknown level 'loud'");
        assert_eq!(err.to_string(), "logging.level: unknown level 'loud'");
        assert_eq!(err.key(), Some("logging.level"));
    }

    #[test]
    fn test_io_error_names_action_and_file() {
        let source = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::io(FileAction::CreateDir, "/srv/.schemagraph", source);
        assert_eq!(
            err.to_string(),
            "cannot create directory /srv/.schemagraph: denied"
        );
        assert_eq!(err.key(), None);
    }

    #[test]
    fn test_parse_error_names_file() {
        let source = toml::from_str::<toml::Value>("[store").unwrap_err();
        let err = ConfigError::parse("/tmp/.schemagraph/config.toml", source);
        assert!(err
            .to_string()
            .starts_with("/tmp/.schemagraph/config.toml is not a valid config file"));
    }
}
