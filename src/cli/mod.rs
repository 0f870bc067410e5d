//! CLI command implementations

pub mod activity;
pub mod init;
pub mod missions;
pub mod profile;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::Serialize;

use questline::{Config, GamificationEngine, SqliteStore};

/// Everything a command needs: the engine and the output mode
pub struct Context {
    pub engine: GamificationEngine,
    pub json: bool,
}

impl Context {
    pub fn open(config_path: Option<&Path>, db_path: Option<&Path>, json: bool) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::from_file(path)?,
            None => Config::load()?,
        };

        let db_path = db_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.database_path());
        tracing::debug!("Using database {}", db_path.display());

        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        let engine = GamificationEngine::from_config(Arc::new(store), &config)?;

        Ok(Self { engine, json })
    }

    /// Print `value` as pretty JSON when `--json` was given, else run `human`
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}
