//! Configuration file I/O operations

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.questline/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".questline")
    }

    /// Get the global config file path (~/.questline/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Database path from settings, or ~/.questline/questline.db
    pub fn database_path(&self) -> PathBuf {
        self.settings
            .database_path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("questline.db"))
    }

    /// Load global configuration from ~/.questline/config.toml.
    ///
    /// A missing file means built-in defaults; nothing is written.
    pub fn load() -> Result<Self> {
        let global_path = Self::global_config_path();
        if !global_path.exists() {
            tracing::debug!("No config at {}, using defaults", global_path.display());
            return Ok(Self::default());
        }
        Self::from_file(&global_path)
    }
}

/// Write a config file with atomic write and file locking.
///
/// This ensures:
/// 1. Exclusive lock prevents concurrent writers from interleaving
/// 2. Atomic write (temp file + rename) prevents corruption on crash
/// 3. Parent directory is created if needed
pub fn write_config_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    // Create lock file (separate from config to avoid issues with rename)
    let lock_path = path.with_extension("toml.lock");
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

    lock_file
        .lock_exclusive()
        .with_context(|| "Failed to acquire config lock")?;

    let temp_path = path.with_extension("toml.tmp");
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| "Failed to write config content")?;

    temp_file
        .sync_all()
        .with_context(|| "Failed to sync config file")?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename config file: {}", path.display()))?;

    // Lock is released when lock_file is dropped
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        write_config_file(&path, "[settings]\nutc_offset = \"-05:00\"\n").unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.settings.utc_offset, "-05:00");
        assert_eq!(
            loaded.database_path(),
            Config::global_config_dir().join("questline.db")
        );
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_file(&path, "[settings]\nmissions_per_period = 5\n").unwrap();
        write_config_file(&path, "[settings]\nmissions_per_period = 2\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().settings.missions_per_period, 2);
    }
}
