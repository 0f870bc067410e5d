//! Mission progress accounting

use std::sync::Arc;

use tracing::{debug, info};

use crate::calendar::Calendar;
use crate::error::Result;
use crate::store::{GamificationStore, MissionInstance};

/// Applies user actions to matching missions
#[derive(Clone)]
pub struct MissionProgressTracker {
    store: Arc<dyn GamificationStore>,
    calendar: Calendar,
}

impl MissionProgressTracker {
    pub fn new(store: Arc<dyn GamificationStore>, calendar: Calendar) -> Self {
        Self { store, calendar }
    }

    /// Add `amount` to every active, unclaimed mission keyed `mission_key`.
    ///
    /// A key may be live in both a daily and a weekly mission; both advance.
    /// Progress is clamped to the target and completed missions stay
    /// completed. Returns the missions that changed.
    pub fn advance(
        &self,
        user_id: &str,
        mission_key: &str,
        amount: u32,
    ) -> Result<Vec<MissionInstance>> {
        if amount == 0 {
            return Ok(Vec::new());
        }
        let now = self.calendar.now_ms();

        let open = self.store.list_open_missions_by_key(user_id, mission_key, now)?;
        let mut updated = Vec::with_capacity(open.len());
        for mission in open.into_iter().filter(|m| !m.is_completed) {
            let Some(after) = self.store.advance_mission(&mission.id, amount, now)? else {
                // Claimed or expired between the read and the write
                continue;
            };
            if after.is_completed {
                info!(user_id, mission_key, id = %after.id, period = %after.period_type, "Mission completed");
            } else {
                debug!(user_id, mission_key, current = after.current, target = after.target, "Mission advanced");
            }
            updated.push(after);
        }

        Ok(updated)
    }
}
