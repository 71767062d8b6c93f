//! # Configuration Management
//!
//! Server configuration is read from an optional JSON file. Every section and
//! field has a default, so a partial file (or none at all) is valid:
//!
//! - [`ServerConfig`]: bind address and the path prefix the repository is mounted at
//! - [`StorageConfig`]: repository root directory and read-only flag
//! - [`RepositoryConfig`]: internal groups, scan depth and stylesheet override
//! - [`LimitsConfig`]: upload size limit
//!
//! ```rust,no_run
//! # use repo_server::config::Config;
//! // Load from file with fallback to defaults
//! let config = Config::load_or_default("config.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Command-line flags are applied on top of the loaded values.

use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub repository: RepositoryConfig,
    pub limits: LimitsConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Host/IP address to bind to
    pub host: String,
    pub port: u16,
    /// Path prefix under which the repository is served, e.g. `/maven`
    pub mount: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8081,
            mount: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the Maven layout
    pub root: PathBuf,
    /// Reject uploads with 403
    pub read_only: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            root: PathBuf::from("./repository"),
            read_only: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Group prefixes whose events are flagged as internal
    pub internal_groups: Vec<String>,
    /// Descend into sub-directories when scanning
    pub recursive_scan: bool,
    /// Replaces the built-in stylesheet when set
    pub stylesheet: Option<PathBuf>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            internal_groups: Vec::new(),
            recursive_scan: true,
            stylesheet: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_upload_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_upload_size_mb: 100,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// Fails when the file cannot be read or does not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config_str = fs::read_to_string(path)?;
        let config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    /// Load configuration from file, using defaults when the file is absent.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.limits.max_upload_size_mb.saturating_mul(1024 * 1024)
    }

    /// Mount prefix without trailing slash; `""` for the root mount.
    pub fn mount_base(&self) -> String {
        let trimmed = self.server.mount.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }
}
