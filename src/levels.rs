//! XP and Level system
//!
//! Level thresholds are configuration: a [`LevelTable`] is built once and
//! handed to whatever needs to turn XP into a level.

use serde::{Deserialize, Serialize};

/// Level definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub level: u32,
    pub xp_required: u64,
    pub title: String,
}

/// One row of a level table as written in config (`[[levels]]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThreshold {
    pub xp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Default thresholds and titles
pub static DEFAULT_LEVELS: &[(u64, &str)] = &[
    (0, "Newcomer"),
    (100, "Regular"),
    (250, "Enthusiast"),
    (500, "Insider"),
    (1000, "Devotee"),
    (1750, "Expert"),
    (2750, "Mentor"),
    (4000, "Champion"),
    (5500, "Luminary"),
    (7500, "Legend"),
    (10000, "Icon"),
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LevelTableError {
    #[error("Level table is empty")]
    Empty,

    #[error("First level must start at 0 XP, got {0}")]
    FirstNotZero(u64),

    #[error("Level {level} threshold {xp} is not above the previous level")]
    NotAscending { level: u32, xp: u64 },
}

/// Monotonic XP thresholds, level 1 at index 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl LevelTable {
    /// Build a table from ascending thresholds. Missing titles become "Level N".
    pub fn new(thresholds: &[LevelThreshold]) -> Result<Self, LevelTableError> {
        let first = thresholds.first().ok_or(LevelTableError::Empty)?;
        if first.xp != 0 {
            return Err(LevelTableError::FirstNotZero(first.xp));
        }

        let mut levels: Vec<Level> = Vec::with_capacity(thresholds.len());
        for (i, t) in thresholds.iter().enumerate() {
            let level = i as u32 + 1;
            if let Some(prev) = levels.last() {
                if t.xp <= prev.xp_required {
                    return Err(LevelTableError::NotAscending { level, xp: t.xp });
                }
            }
            levels.push(Level {
                level,
                xp_required: t.xp,
                title: t
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Level {}", level)),
            });
        }

        Ok(Self { levels })
    }

    /// Build a table from bare XP thresholds
    pub fn from_thresholds(xp: &[u64]) -> Result<Self, LevelTableError> {
        let rows: Vec<LevelThreshold> = xp
            .iter()
            .map(|&xp| LevelThreshold { xp, title: None })
            .collect();
        Self::new(&rows)
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Level definition for the given XP
    pub fn info_for(&self, total_xp: u64) -> &Level {
        // First threshold is 0, so the partition point is always >= 1
        let idx = self
            .levels
            .partition_point(|l| l.xp_required <= total_xp)
            .saturating_sub(1);
        &self.levels[idx]
    }

    /// Highest level whose threshold is <= `total_xp`
    pub fn level_for(&self, total_xp: u64) -> u32 {
        self.info_for(total_xp).level
    }

    /// XP threshold of `level`, clamped to the table's range
    pub fn threshold_of(&self, level: u32) -> u64 {
        self.get(level.clamp(1, self.max_level())).xp_required
    }

    /// Threshold of `level + 1`, or the top threshold at max level
    pub fn xp_for_next_level(&self, level: u32) -> u64 {
        let next = level.saturating_add(1).clamp(1, self.max_level());
        self.get(next).xp_required
    }

    pub fn max_level(&self) -> u32 {
        self.levels.len() as u32
    }

    fn get(&self, level: u32) -> &Level {
        &self.levels[(level - 1) as usize]
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS
                .iter()
                .enumerate()
                .map(|(i, (xp, title))| Level {
                    level: i as u32 + 1,
                    xp_required: *xp,
                    title: (*title).to_string(),
                })
                .collect(),
        }
    }
}

/// A user's XP position within a level table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerStats {
    pub total_xp: u64,
    pub level: u32,
    pub title: String,
    /// XP needed for current level
    pub current_level_xp: u64,
    /// XP needed for next level (None if max)
    pub next_level_xp: Option<u64>,
}

impl PlayerStats {
    pub fn new(table: &LevelTable, total_xp: u64) -> Self {
        let info = table.info_for(total_xp);
        let next_level_xp = if info.level < table.max_level() {
            Some(table.xp_for_next_level(info.level))
        } else {
            None
        };

        Self {
            total_xp,
            level: info.level,
            title: info.title.clone(),
            current_level_xp: info.xp_required,
            next_level_xp,
        }
    }

    /// Calculate progress percentage to next level (0.0 - 1.0)
    pub fn progress_to_next(&self) -> f32 {
        match self.next_level_xp {
            Some(next) => {
                let xp_in_level = self.total_xp - self.current_level_xp;
                let xp_for_level = next - self.current_level_xp;
                if xp_for_level == 0 {
                    1.0
                } else {
                    (xp_in_level as f32) / (xp_for_level as f32)
                }
            }
            None => 1.0,
        }
    }

    pub fn is_max_level(&self) -> bool {
        self.next_level_xp.is_none()
    }
}

/// Reached when a credit crosses one or more thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
    pub new_title: String,
}
