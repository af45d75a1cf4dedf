//! Application configuration
//!
//! Where the hint cache lives and where backups go by default. Both
//! can be overridden from the CLI.

use std::path::PathBuf;

/// Cache file name, kept directly under the user's home directory.
const CACHE_FILE_NAME: &str = ".savekeeper_cache.json";

/// Default backup destination folder under the user's home directory.
const DEFAULT_BACKUP_DIR_NAME: &str = "GameSaveBackups";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the JSON hint cache.
    pub cache_path: PathBuf,

    /// Root folder backups are created under.
    pub backup_root: PathBuf,
}

impl AppConfig {
    /// Build the default configuration for the current user.
    pub fn from_system() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self {
            cache_path: home.join(CACHE_FILE_NAME),
            backup_root: home.join(DEFAULT_BACKUP_DIR_NAME),
        })
    }

    /// Validate the configuration before use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backup_root.exists() && !self.backup_root.is_dir() {
            return Err(ConfigError::BackupRootNotDir(self.backup_root.clone()));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine the user home directory")]
    NoHomeDir,

    #[error("Backup destination exists but is not a directory: {0}")]
    BackupRootNotDir(PathBuf),
}
