//! Runtime configuration
//!
//! Values come from defaults, then an optional TOML file, then environment
//! variables. Front ends apply their own flags on top.

use crate::error::ConfigError;
use crate::scan::ScanSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the record store directory
pub const ENV_STORAGE_PATH: &str = "SHELFSCAN_STORAGE_PATH";

/// Overrides the lookup endpoint
pub const ENV_LOOKUP_ENDPOINT: &str = "SHELFSCAN_LOOKUP_ENDPOINT";

const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/books/v1/volumes";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Root directory of the record store
    pub storage_path: PathBuf,

    pub lookup: LookupConfig,

    pub scan: ScanSettings,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            lookup: LookupConfig::default(),
            scan: ScanSettings::default(),
        }
    }
}

/// Lookup gateway settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LookupConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Budget for the cover fetch; exceeding it yields an empty cover
    pub cover_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 15,
            cover_timeout_secs: 10,
            user_agent: format!("shelfscan/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cover_timeout(&self) -> Duration {
        Duration::from_secs(self.cover_timeout_secs)
    }
}

impl CatalogConfig {
    /// Load configuration from `path` (if given) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides read through `var`
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var(ENV_STORAGE_PATH).filter(|v| !v.is_empty()) {
            self.storage_path = PathBuf::from(path);
        }
        if let Some(endpoint) = var(ENV_LOOKUP_ENDPOINT).filter(|v| !v.is_empty()) {
            self.lookup.endpoint = endpoint;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookup.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("lookup.endpoint is empty".to_string()));
        }
        if self.lookup.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "lookup.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.scan.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "scan.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_storage_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "shelfscan")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./shelfscan_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shelfscan.toml");
        std::fs::write(
            &path,
            "storage_path = \"/tmp/books\"\n[lookup]\ncover_timeout_secs = 3\n",
        )
        .unwrap();

        let config = CatalogConfig::from_file(&path).unwrap();
        assert_eq!(config.storage_path, PathBuf::from("/tmp/books"));
        assert_eq!(config.lookup.cover_timeout(), Duration::from_secs(3));
        assert_eq!(config.lookup.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.scan, ScanSettings::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = CatalogConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shelfscan.toml");
        std::fs::write(&path, "storage_path = [").unwrap();
        assert!(matches!(
            CatalogConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_STORAGE_PATH, "/srv/shelf"),
            (ENV_LOOKUP_ENDPOINT, "http://localhost:9/volumes"),
        ]
        .into_iter()
        .collect();

        let mut config = CatalogConfig::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.storage_path, PathBuf::from("/srv/shelf"));
        assert_eq!(config.lookup.endpoint, "http://localhost:9/volumes");
    }

    #[test]
    fn test_validation() {
        let mut config = CatalogConfig::default();
        assert!(config.validate().is_ok());
        config.lookup.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
