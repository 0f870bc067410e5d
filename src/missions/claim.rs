//! Reward claiming
//!
//! A completed mission moves to claimed exactly once. The claimed flag is
//! flipped before any XP is credited, and only the request whose flip
//! succeeded goes on to credit.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::calendar::Calendar;
use crate::error::{GamificationError, Result};
use crate::levels::{LevelTable, LevelUp};
use crate::store::GamificationStore;

/// Result of a successful claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimOutcome {
    pub mission_id: String,
    pub xp_awarded: u64,
    pub new_total_xp: u64,
    pub new_level: u32,
    pub level_up: Option<LevelUp>,
    pub bonus_reward: Option<String>,
}

/// Converts completed missions into XP
#[derive(Clone)]
pub struct RewardClaimer {
    store: Arc<dyn GamificationStore>,
    levels: Arc<LevelTable>,
    calendar: Calendar,
}

impl RewardClaimer {
    pub fn new(
        store: Arc<dyn GamificationStore>,
        levels: Arc<LevelTable>,
        calendar: Calendar,
    ) -> Self {
        Self {
            store,
            levels,
            calendar,
        }
    }

    pub fn claim(&self, user_id: &str, mission_id: &str) -> Result<ClaimOutcome> {
        let mission = self
            .store
            .get_mission(mission_id)?
            .filter(|m| m.user_id == user_id)
            .ok_or(GamificationError::NotFound)?;

        if !mission.is_completed {
            return Err(GamificationError::NotCompleted);
        }
        if mission.is_claimed {
            return Err(GamificationError::AlreadyClaimed);
        }

        if !self.store.conditional_claim(mission_id, self.calendar.now_ms())? {
            // The mission was completed when read, so only a concurrent claim can explain this
            warn!(user_id, mission_id, "Lost claim race");
            return Err(GamificationError::AlreadyClaimed);
        }

        let amount = u64::from(mission.xp_reward);
        let record = self
            .store
            .increment_xp(user_id, amount, self.levels.level_for(amount))?;

        let old_level = self.levels.level_for(record.total_xp.saturating_sub(amount));
        let new_level = self.levels.level_for(record.total_xp);
        if new_level != record.level {
            // False means a newer credit landed; its claim stores the level
            self.store.set_level(user_id, new_level, record.total_xp)?;
        }

        let level_up = (new_level > old_level).then(|| LevelUp {
            old_level,
            new_level,
            new_title: self.levels.info_for(record.total_xp).title.clone(),
        });

        info!(
            user_id,
            mission_id,
            key = %mission.mission_key,
            xp = amount,
            total_xp = record.total_xp,
            level = new_level,
            "Mission reward claimed"
        );
        if let Some(up) = &level_up {
            info!(user_id, old = up.old_level, new = up.new_level, title = %up.new_title, "Level up");
        }

        Ok(ClaimOutcome {
            mission_id: mission.id,
            xp_awarded: amount,
            new_total_xp: record.total_xp,
            new_level,
            level_up,
            bonus_reward: mission.bonus_reward,
        })
    }
}
