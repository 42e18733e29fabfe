//! Error types for Shelfscan Core

use crate::controller::{Action, StateKind};
use thiserror::Error;

/// Result type alias using CatalogError
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Top-level error type for all catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: StateKind, action: Action },

    #[error("No catalog entry with ISBN {0}")]
    UnknownRecord(String),

    #[error("The entry has no ISBN to look up")]
    MissingIsbn,
}

/// Errors that occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    #[error("Corrupt entry {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

impl StorageError {
    /// Classify an I/O failure for `path`
    pub(crate) fn from_io(path: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                StorageError::PermissionDenied(format!("{}: {}", path, err))
            }
            _ => StorageError::BackendError(format!("{}: {}", path, err)),
        }
    }
}

/// Fatal failures of a metadata lookup
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("No bibliographic record for ISBN {0}")]
    NotFound(String),

    #[error("Lookup transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Transport(err.to_string())
    }
}

/// Cover fetch failures. Never fatal to a lookup.
#[derive(Debug, Error)]
pub enum CoverError {
    #[error("Cover request failed: {0}")]
    Transport(String),

    #[error("Cover server answered with status {0}")]
    Status(u16),

    #[error("Cover fetch timed out")]
    Timeout,
}

impl From<reqwest::Error> for CoverError {
    fn from(err: reqwest::Error) -> Self {
        CoverError::Transport(err.to_string())
    }
}

/// Failures acquiring or controlling the scan engine
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scanner permission denied: {0}")]
    PermissionDenied(String),

    #[error("Scanner unavailable: {0}")]
    Unavailable(String),

    #[error("Scanner engine failure: {0}")]
    Engine(String),
}

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_classification() {
        let err = StorageError::from_io(
            "a.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, StorageError::NotFound(ref p) if p == "a.json"));

        let err = StorageError::from_io(
            "a.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, StorageError::PermissionDenied(_)));

        let err = StorageError::from_io("a.json", std::io::Error::other("disk"));
        assert!(matches!(err, StorageError::BackendError(_)));
    }

    #[test]
    fn test_transition_message() {
        let err = CatalogError::InvalidTransition {
            state: StateKind::Fetching,
            action: Action::Scan,
        };
        assert_eq!(err.to_string(), "Cannot scan while fetching");
    }
}
