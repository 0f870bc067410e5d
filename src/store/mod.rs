//! Persistence boundary for gamification state
//!
//! Every state transition the engine makes is a single call on
//! [`GamificationStore`]. Implementations must make each call atomic:
//!
//! - `save_streak` is a compare-and-swap on the record version
//! - `insert_missions_if_absent` inserts a whole mission set or nothing,
//!   at most once per (user, period, window)
//! - `advance_mission` and `conditional_claim` are conditional updates
//! - `increment_xp` is an additive upsert
//!
//! [`SqliteStore`] is the bundled implementation.

mod sqlite;

pub use sqlite::SqliteStore;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::StoreError;
use crate::missions::{MissionCategory, PeriodType};

/// Daily activity streak for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakRecord {
    pub user_id: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active_date: Option<NaiveDate>,
    pub total_days_active: u32,
    /// Version the record was read at, 0 for a record not yet stored
    pub version: u64,
}

impl StreakRecord {
    /// Check if the streak is still alive (activity today or yesterday)
    pub fn is_active(&self, today: NaiveDate) -> bool {
        match self.last_active_date {
            Some(last) => (today - last).num_days() <= 1,
            None => false,
        }
    }
}

/// A per-user, per-period assignment of a mission template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissionInstance {
    pub id: String,
    pub user_id: String,
    pub period_type: PeriodType,
    pub mission_key: String,
    pub title: String,
    pub category: MissionCategory,
    pub target: u32,
    pub current: u32,
    pub xp_reward: u32,
    pub bonus_reward: Option<String>,
    /// Last millisecond the mission counts as active
    pub expires_at: i64,
    pub created_at: i64,
    pub is_completed: bool,
    pub is_claimed: bool,
    pub claimed_at: Option<i64>,
}

impl MissionInstance {
    pub fn is_active(&self, now_ms: i64) -> bool {
        self.expires_at >= now_ms
    }

    /// Completed and waiting for its reward
    pub fn is_claimable(&self) -> bool {
        self.is_completed && !self.is_claimed
    }

    /// Calculate progress percentage (0.0 - 1.0)
    pub fn progress_percent(&self) -> f32 {
        if self.is_completed || self.target == 0 {
            1.0
        } else {
            (self.current as f32 / self.target as f32).min(1.0)
        }
    }
}

/// Total XP and cached level for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XpRecord {
    pub user_id: String,
    pub total_xp: u64,
    pub level: u32,
}

/// Durable storage for streaks, missions and XP
pub trait GamificationStore: Send + Sync {
    fn get_streak(&self, user_id: &str) -> Result<Option<StreakRecord>, StoreError>;

    /// Store `record` if nobody wrote since it was read at `record.version`.
    ///
    /// Version 0 means the record must not exist yet. Returns `false` when
    /// another writer got there first; nothing is written in that case.
    fn save_streak(&self, record: &StreakRecord) -> Result<bool, StoreError>;

    /// Missions of `period` whose expiry is at or after `now_ms`
    fn list_active_missions(
        &self,
        user_id: &str,
        period: PeriodType,
        now_ms: i64,
    ) -> Result<Vec<MissionInstance>, StoreError>;

    /// Active, unclaimed missions with the given key, across all periods
    fn list_open_missions_by_key(
        &self,
        user_id: &str,
        mission_key: &str,
        now_ms: i64,
    ) -> Result<Vec<MissionInstance>, StoreError>;

    /// Insert a mission set for the window starting at `window_start`.
    ///
    /// Returns `false` without inserting anything if a set for the same
    /// (user, period, window) already exists.
    fn insert_missions_if_absent(
        &self,
        user_id: &str,
        period: PeriodType,
        window_start: NaiveDate,
        missions: &[MissionInstance],
    ) -> Result<bool, StoreError>;

    /// Insert one mission outside of any generated set
    fn insert_mission(&self, mission: &MissionInstance) -> Result<(), StoreError>;

    fn get_mission(&self, id: &str) -> Result<Option<MissionInstance>, StoreError>;

    /// Add `amount` to an active, unclaimed mission, clamped to its target.
    ///
    /// Returns the updated mission, or `None` if it no longer qualifies.
    fn advance_mission(
        &self,
        id: &str,
        amount: u32,
        now_ms: i64,
    ) -> Result<Option<MissionInstance>, StoreError>;

    /// Flip a completed mission to claimed. Only one caller ever gets `true`.
    fn conditional_claim(&self, id: &str, now_ms: i64) -> Result<bool, StoreError>;

    fn get_xp(&self, user_id: &str) -> Result<Option<XpRecord>, StoreError>;

    /// Add `amount` to the user's XP, creating the record at
    /// `initial_level` if absent. Returns the record after the increment.
    fn increment_xp(
        &self,
        user_id: &str,
        amount: u64,
        initial_level: u32,
    ) -> Result<XpRecord, StoreError>;

    /// Store `level` if the user's total XP is still `total_xp`.
    ///
    /// Returns `false` when a later credit moved the total; the claim behind
    /// that credit writes its own level.
    fn set_level(&self, user_id: &str, level: u32, total_xp: u64) -> Result<bool, StoreError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Store wrapper that runs hooks before delegating to [`SqliteStore`]

    use super::*;

    type ListHook = Box<dyn Fn(&str) + Send + Sync>;
    type SaveStreakHook = Box<dyn Fn(&SqliteStore, &StreakRecord) + Send + Sync>;

    pub struct HookedStore {
        pub inner: SqliteStore,
        before_list_active: Option<ListHook>,
        before_save_streak: Option<SaveStreakHook>,
    }

    impl HookedStore {
        pub fn new(inner: SqliteStore) -> Self {
            Self {
                inner,
                before_list_active: None,
                before_save_streak: None,
            }
        }

        /// Run `hook(user_id)` before every `list_active_missions`
        pub fn before_list_active(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
            self.before_list_active = Some(Box::new(hook));
            self
        }

        /// Run `hook(inner, record)` before every `save_streak`
        pub fn before_save_streak(
            mut self,
            hook: impl Fn(&SqliteStore, &StreakRecord) + Send + Sync + 'static,
        ) -> Self {
            self.before_save_streak = Some(Box::new(hook));
            self
        }
    }

    impl GamificationStore for HookedStore {
        fn get_streak(&self, user_id: &str) -> Result<Option<StreakRecord>, StoreError> {
            self.inner.get_streak(user_id)
        }

        fn save_streak(&self, record: &StreakRecord) -> Result<bool, StoreError> {
            if let Some(hook) = &self.before_save_streak {
                hook(&self.inner, record);
            }
            self.inner.save_streak(record)
        }

        fn list_active_missions(
            &self,
            user_id: &str,
            period: PeriodType,
            now_ms: i64,
        ) -> Result<Vec<MissionInstance>, StoreError> {
            if let Some(hook) = &self.before_list_active {
                hook(user_id);
            }
            self.inner.list_active_missions(user_id, period, now_ms)
        }

        fn list_open_missions_by_key(
            &self,
            user_id: &str,
            mission_key: &str,
            now_ms: i64,
        ) -> Result<Vec<MissionInstance>, StoreError> {
            self.inner.list_open_missions_by_key(user_id, mission_key, now_ms)
        }

        fn insert_missions_if_absent(
            &self,
            user_id: &str,
            period: PeriodType,
            window_start: NaiveDate,
            missions: &[MissionInstance],
        ) -> Result<bool, StoreError> {
            self.inner
                .insert_missions_if_absent(user_id, period, window_start, missions)
        }

        fn insert_mission(&self, mission: &MissionInstance) -> Result<(), StoreError> {
            self.inner.insert_mission(mission)
        }

        fn get_mission(&self, id: &str) -> Result<Option<MissionInstance>, StoreError> {
            self.inner.get_mission(id)
        }

        fn advance_mission(
            &self,
            id: &str,
            amount: u32,
            now_ms: i64,
        ) -> Result<Option<MissionInstance>, StoreError> {
            self.inner.advance_mission(id, amount, now_ms)
        }

        fn conditional_claim(&self, id: &str, now_ms: i64) -> Result<bool, StoreError> {
            self.inner.conditional_claim(id, now_ms)
        }

        fn get_xp(&self, user_id: &str) -> Result<Option<XpRecord>, StoreError> {
            self.inner.get_xp(user_id)
        }

        fn increment_xp(
            &self,
            user_id: &str,
            amount: u64,
            initial_level: u32,
        ) -> Result<XpRecord, StoreError> {
            self.inner.increment_xp(user_id, amount, initial_level)
        }

        fn set_level(&self, user_id: &str, level: u32, total_xp: u64) -> Result<bool, StoreError> {
            self.inner.set_level(user_id, level, total_xp)
        }
    }
}
