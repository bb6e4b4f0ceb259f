use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::UserEntry;

/// Top-level configuration, loaded from `casework.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Users for the static directory authenticator.
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inactivity window in minutes before a session is force-expired.
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: i64,
}

impl SessionConfig {
    #[must_use]
    pub fn timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.timeout_minutes)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_timeout_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path, relative to the config file's directory when
    /// not absolute.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

const fn default_timeout_minutes() -> i64 {
    30
}

fn default_db_path() -> PathBuf {
    PathBuf::from("casework.db")
}

/// Load config from `<dir>/casework.toml`; a missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(dir: &Path) -> Result<WorkflowConfig> {
    let path = dir.join("casework.toml");
    if !path.exists() {
        return Ok(WorkflowConfig::default());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
}
