//! Settings configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::missions::DEFAULT_MISSIONS_PER_PERIOD;

/// General settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Offset used to decide where a calendar day starts, e.g. "+01:00"
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,

    /// Missions issued per daily and per weekly set
    #[serde(default = "default_missions_per_period")]
    pub missions_per_period: usize,

    /// SQLite database path (defaults to ~/.questline/questline.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_missions_per_period() -> usize {
    DEFAULT_MISSIONS_PER_PERIOD
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
            missions_per_period: default_missions_per_period(),
            database_path: None,
        }
    }
}
