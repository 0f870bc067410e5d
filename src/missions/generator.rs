//! Mission set generation
//!
//! A user gets one mission set per day and one per week. Generation is lazy:
//! it happens the first time missions are requested in a new period.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::catalog::{Catalog, MissionTemplate, PeriodType};
use super::random::{sample, RandomSource};
use crate::calendar::Calendar;
use crate::error::{GamificationError, Result};
use crate::store::{GamificationStore, MissionInstance};

/// Number of missions issued per daily or weekly set
pub const DEFAULT_MISSIONS_PER_PERIOD: usize = 3;

/// Issues mission sets and one-off special missions
#[derive(Clone)]
pub struct MissionGenerator {
    store: Arc<dyn GamificationStore>,
    catalog: Arc<Catalog>,
    calendar: Calendar,
    missions_per_period: usize,
    /// Locked only while drawing a sample, never across store calls
    rng: Arc<Mutex<Box<dyn RandomSource>>>,
}

impl MissionGenerator {
    pub fn new(
        store: Arc<dyn GamificationStore>,
        catalog: Arc<Catalog>,
        calendar: Calendar,
        missions_per_period: usize,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            store,
            catalog,
            calendar,
            missions_per_period,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Make sure the user has missions for the current `period`.
    ///
    /// Returns `true` if this call created the set. Any active mission for
    /// the period, or a set already stored for the same window, makes this a
    /// no-op. Special missions are never generated here.
    pub fn ensure_missions_for_period(&self, user_id: &str, period: PeriodType) -> Result<bool> {
        let Some((window_start, expires_at)) = self.window(period) else {
            return Ok(false);
        };
        let now = self.calendar.now_ms();

        let active = self.store.list_active_missions(user_id, period, now)?;
        if !active.is_empty() {
            debug!(user_id, %period, count = active.len(), "Missions already active");
            return Ok(false);
        }

        let pool = self.catalog.for_period(period);
        if pool.is_empty() {
            warn!(%period, "Catalog has no templates for period");
            return Ok(false);
        }

        let picked = {
            // The source holds no invariants a panic could break
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            sample(&pool, self.missions_per_period, &mut **rng)
        };
        let missions: Vec<MissionInstance> = picked
            .into_iter()
            .map(|t| instantiate(t, user_id, period, expires_at.timestamp_millis(), now))
            .collect();

        let inserted = self
            .store
            .insert_missions_if_absent(user_id, period, window_start, &missions)?;
        if inserted {
            info!(
                user_id,
                %period,
                %window_start,
                keys = ?missions.iter().map(|m| m.mission_key.as_str()).collect::<Vec<_>>(),
                "Generated missions"
            );
        } else {
            // Lost the race to a concurrent request; its set stands
            debug!(user_id, %period, %window_start, "Mission set already generated");
        }
        Ok(inserted)
    }

    /// Grant a one-off special mission from a catalog template
    pub fn grant_special(
        &self,
        user_id: &str,
        mission_key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<MissionInstance> {
        let template = self
            .catalog
            .get(mission_key)
            .ok_or_else(|| GamificationError::UnknownMission(mission_key.to_string()))?;

        let mission = instantiate(
            template,
            user_id,
            PeriodType::Special,
            expires_at.timestamp_millis(),
            self.calendar.now_ms(),
        );
        self.store.insert_mission(&mission)?;
        info!(user_id, mission_key, id = %mission.id, "Granted special mission");
        Ok(mission)
    }

    /// (window start, expiry) of the current period
    fn window(&self, period: PeriodType) -> Option<(NaiveDate, DateTime<Utc>)> {
        match period {
            PeriodType::Daily => Some((self.calendar.today(), self.calendar.end_of_day())),
            PeriodType::Weekly => Some((self.calendar.start_of_week(), self.calendar.end_of_week())),
            PeriodType::Special => None,
        }
    }
}

fn instantiate(
    template: &MissionTemplate,
    user_id: &str,
    period: PeriodType,
    expires_at: i64,
    now: i64,
) -> MissionInstance {
    MissionInstance {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        period_type: period,
        mission_key: template.key.clone(),
        title: template.title.clone(),
        category: template.category,
        target: template.target,
        current: 0,
        xp_reward: template.xp_reward,
        bonus_reward: template.bonus_reward.clone(),
        expires_at,
        created_at: now,
        is_completed: false,
        is_claimed: false,
        claimed_at: None,
    }
}
