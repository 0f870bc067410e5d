//! Configuration loading and management

mod io;
mod settings;

pub use io::write_config_file;
pub use settings::Settings;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::calendar::parse_utc_offset;
use crate::levels::{LevelTable, LevelThreshold};
use crate::missions::{Catalog, MissionTemplate};

/// Main configuration structure
///
/// Empty `levels` or `missions` tables fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// Level thresholds, lowest first (`[[levels]]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<LevelThreshold>,

    /// Mission templates (`[[missions]]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missions: Vec<MissionTemplate>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        // Surface bad values at load time rather than on first use
        config.utc_offset()?;
        Ok(config)
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.settings.utc_offset)
            .ok_or_else(|| anyhow!("Invalid utc_offset: {:?}", self.settings.utc_offset))
    }

    pub fn level_table(&self) -> Result<LevelTable> {
        if self.levels.is_empty() {
            return Ok(LevelTable::default());
        }
        Ok(LevelTable::new(&self.levels)?)
    }

    pub fn catalog(&self) -> Result<Catalog> {
        if self.missions.is_empty() {
            return Ok(Catalog::default());
        }
        Ok(Catalog::new(self.missions.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::missions::{MissionCategory, PeriodType};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.settings.missions_per_period, 3);
        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), 0);
        assert_eq!(config.level_table().unwrap(), LevelTable::default());
        assert_eq!(config.catalog().unwrap(), Catalog::default());
    }

    #[test]
    fn test_custom_tables() {
        let config = Config::parse(
            r#"
            [settings]
            utc_offset = "+09:00"
            missions_per_period = 2

            [[levels]]
            xp = 0
            title = "Rookie"

            [[levels]]
            xp = 100

            [[missions]]
            key = "read_article"
            title = "Read an article"
            category = "learn"
            target = 2
            xp_reward = 20
            period = "daily"

            [[missions]]
            key = "host_event"
            title = "Host an event"
            category = "social"
            target = 1
            xp_reward = 200
            bonus_reward = "Host badge"
            period = "weekly"
            "#,
        )
        .unwrap();

        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), 9 * 3600);
        assert_eq!(config.settings.missions_per_period, 2);

        let levels = config.level_table().unwrap();
        assert_eq!(levels.max_level(), 2);
        assert_eq!(levels.info_for(0).title, "Rookie");
        assert_eq!(levels.info_for(150).title, "Level 2");

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        let host = catalog.get("host_event").unwrap();
        assert_eq!(host.category, MissionCategory::Social);
        assert_eq!(host.period, PeriodType::Weekly);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::parse("[settings]\nutc_offset = \"nowhere\"").is_err());

        let bad_levels = Config::parse("[[levels]]\nxp = 5").unwrap();
        assert!(bad_levels.level_table().is_err());
    }
}
