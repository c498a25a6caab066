//! Configuration management for git-reparent.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// git-reparent configuration loaded from `<git-dir>/reparent.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backup branch settings.
    #[serde(default)]
    pub backup: BackupConfig,
}

impl Config {
    /// File name within the git directory.
    pub const FILE_NAME: &'static str = "reparent.toml";

    /// Path of the config file for a git directory.
    #[must_use]
    pub fn path_in(git_dir: impl AsRef<Path>) -> PathBuf {
        git_dir.as_ref().join(Self::FILE_NAME)
    }

    /// Load config from a TOML file.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// General settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Always create a backup branch before reparenting.
    #[serde(default)]
    pub backup: bool,

    /// Always ask for confirmation before reparenting.
    #[serde(default)]
    pub confirm: bool,
}

/// Backup branch settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// First path component of backup branch names.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

fn default_prefix() -> String {
    "backups".into()
}
