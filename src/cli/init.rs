//! Init command implementation

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use questline::config::write_config_file;
use questline::Config;

/// Default configuration content for questline init
pub const DEFAULT_CONFIG: &str = r#"# Questline Configuration
# =======================
#
# Every section is optional. Missing sections fall back to built-in defaults.

# ============================================================================
# SETTINGS - Global configuration options
# ============================================================================
#
# Available options:
#   utc_offset          - Offset where a calendar day starts, e.g. "+01:00" (default: "+00:00")
#   missions_per_period - Missions issued per daily and per weekly set (default: 3)
#   database_path       - SQLite database file (default: ~/.questline/questline.db)

[settings]
utc_offset = "+00:00"
missions_per_period = 3
# database_path = "/var/lib/questline/questline.db"

# ============================================================================
# LEVELS - XP thresholds, lowest first
# ============================================================================
#
# The first level must start at 0 XP and thresholds must strictly increase.
# Levels without a title are shown as "Level N".
# Uncomment to replace the default table:
#
# [[levels]]
# xp = 0
# title = "Newcomer"
#
# [[levels]]
# xp = 100
# title = "Regular"
#
# [[levels]]
# xp = 250

# ============================================================================
# MISSIONS - Templates that daily and weekly sets are sampled from
# ============================================================================
#
# Available options:
#   key          - Stable id, also the action name passed to `questline advance`
#   title        - Shown to the user
#   category     - watch, engage, learn, social or challenge
#   target       - Occurrences needed to complete (> 0)
#   xp_reward    - XP credited on claim (> 0)
#   bonus_reward - Optional label for an extra reward
#   period       - daily, weekly or special (special is only issued by `questline grant`)
#
# Defining any [[missions]] replaces the whole default catalog.
#
# [[missions]]
# key = "watch_video"
# title = "Watch a video"
# category = "watch"
# target = 1
# xp_reward = 10
# period = "daily"
#
# [[missions]]
# key = "complete_course"
# title = "Finish a course"
# category = "learn"
# target = 1
# xp_reward = 150
# bonus_reward = "Course Finisher badge"
# period = "weekly"
"#;

/// Write the default config to `config_path` (or ~/.questline/config.toml)
pub fn init_command(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    write_config_file(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created: {}", config_path.display());

    Ok(())
}
