//! Mission templates
//!
//! The catalog is fixed at startup. It ships with a default set of daily and
//! weekly missions and can be replaced from config (`[[missions]]`).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Lifetime of a mission instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Expires at the end of the current day
    Daily,
    /// Expires at the end of the current week
    Weekly,
    /// Granted one-off with an explicit expiry
    Special,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Special => "special",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "special" => Some(Self::Special),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Daily Missions",
            Self::Weekly => "Weekly Missions",
            Self::Special => "Special Missions",
        }
    }
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mission category (for display grouping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionCategory {
    Watch,
    Engage,
    Learn,
    Social,
    Challenge,
}

impl MissionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watch => "watch",
            Self::Engage => "engage",
            Self::Learn => "learn",
            Self::Social => "social",
            Self::Challenge => "challenge",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "watch" => Some(Self::Watch),
            "engage" => Some(Self::Engage),
            "learn" => Some(Self::Learn),
            "social" => Some(Self::Social),
            "challenge" => Some(Self::Challenge),
            _ => None,
        }
    }
}

/// Mission definition with all metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionTemplate {
    /// Stable key, also the action name progress is reported under
    pub key: String,
    pub title: String,
    pub category: MissionCategory,
    pub target: u32,
    pub xp_reward: u32,
    /// Extra reward label shown to the user (badge, coupon)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_reward: Option<String>,
    pub period: PeriodType,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Duplicate mission key: {0}")]
    DuplicateKey(String),

    #[error("Mission {0} has a zero target")]
    ZeroTarget(String),

    #[error("Mission {0} has a zero XP reward")]
    ZeroReward(String),

    #[error("Mission {0} has an empty key")]
    EmptyKey(String),
}

/// (key, title, category, target, xp, bonus, period)
type TemplateRow = (
    &'static str,
    &'static str,
    MissionCategory,
    u32,
    u32,
    Option<&'static str>,
    PeriodType,
);

static DEFAULT_TEMPLATES: &[TemplateRow] = &[
    // ============================================================
    // DAILY
    // ============================================================
    ("watch_video", "Watch a video", MissionCategory::Watch, 1, 10, None, PeriodType::Daily),
    ("watch_videos_3", "Watch 3 videos", MissionCategory::Watch, 3, 25, None, PeriodType::Daily),
    ("post_comment", "Leave a comment", MissionCategory::Engage, 1, 15, None, PeriodType::Daily),
    ("like_content", "Like 5 posts", MissionCategory::Engage, 5, 10, None, PeriodType::Daily),
    ("complete_lesson", "Finish a lesson", MissionCategory::Learn, 1, 20, None, PeriodType::Daily),
    ("share_content", "Share something you enjoyed", MissionCategory::Social, 1, 15, None, PeriodType::Daily),
    ("daily_quiz", "Pass the daily quiz", MissionCategory::Challenge, 1, 30, None, PeriodType::Daily),
    // ============================================================
    // WEEKLY
    // ============================================================
    ("watch_videos_15", "Watch 15 videos", MissionCategory::Watch, 15, 100, None, PeriodType::Weekly),
    ("post_comments_10", "Leave 10 comments", MissionCategory::Engage, 10, 80, None, PeriodType::Weekly),
    ("complete_course", "Finish a course", MissionCategory::Learn, 1, 150, Some("Course Finisher badge"), PeriodType::Weekly),
    ("complete_lessons_5", "Finish 5 lessons", MissionCategory::Learn, 5, 90, None, PeriodType::Weekly),
    ("invite_friend", "Invite a friend", MissionCategory::Social, 1, 120, Some("Ambassador badge"), PeriodType::Weekly),
    ("active_days_5", "Be active on 5 days", MissionCategory::Challenge, 5, 150, Some("Regular badge"), PeriodType::Weekly),
];

/// Immutable set of mission templates, keyed by [`MissionTemplate::key`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    templates: Vec<MissionTemplate>,
}

impl Catalog {
    pub fn new(templates: Vec<MissionTemplate>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for t in &templates {
            if t.key.trim().is_empty() {
                return Err(CatalogError::EmptyKey(t.title.clone()));
            }
            if !seen.insert(t.key.as_str()) {
                return Err(CatalogError::DuplicateKey(t.key.clone()));
            }
            if t.target == 0 {
                return Err(CatalogError::ZeroTarget(t.key.clone()));
            }
            if t.xp_reward == 0 {
                return Err(CatalogError::ZeroReward(t.key.clone()));
            }
        }
        Ok(Self { templates })
    }

    pub fn get(&self, key: &str) -> Option<&MissionTemplate> {
        self.templates.iter().find(|t| t.key == key)
    }

    /// Templates issued for `period`, in catalog order
    pub fn for_period(&self, period: PeriodType) -> Vec<&MissionTemplate> {
        self.templates.iter().filter(|t| t.period == period).collect()
    }

    pub fn templates(&self) -> &[MissionTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            templates: DEFAULT_TEMPLATES
                .iter()
                .map(|(key, title, category, target, xp, bonus, period)| MissionTemplate {
                    key: (*key).to_string(),
                    title: (*title).to_string(),
                    category: *category,
                    target: *target,
                    xp_reward: *xp,
                    bonus_reward: bonus.map(str::to_string),
                    period: *period,
                })
                .collect(),
        }
    }
}
