//! Engine facade
//!
//! [`GamificationEngine`] is what callers talk to. It owns no gamification
//! state of its own: every call goes to the store. The only in-process state
//! is the random source used to pick missions, locked just long enough to
//! draw a sample.
//!
//! # Usage
//!
//! ```ignore
//! let config = Config::load()?;
//! let store = Arc::new(SqliteStore::open(&config.database_path())?);
//! let engine = GamificationEngine::from_config(store, &config)?;
//!
//! engine.record_activity("user-1")?;
//! let missions = engine.get_missions("user-1")?;
//! engine.advance_mission("user-1", "watch_video", 1)?;
//! let outcome = engine.claim_mission("user-1", &missions[0].id)?;
//! ```

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::calendar::{Calendar, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::levels::{LevelTable, PlayerStats};
use crate::missions::{
    Catalog, ClaimOutcome, MissionGenerator, MissionProgressTracker, PeriodType, RandomSource,
    RewardClaimer, DEFAULT_MISSIONS_PER_PERIOD,
};
use crate::store::{GamificationStore, MissionInstance, StreakRecord};
use crate::streaks::{StreakTracker, StreakUpdate};

/// Builder for [`GamificationEngine`]; every piece has a default
pub struct EngineBuilder {
    store: Arc<dyn GamificationStore>,
    catalog: Catalog,
    levels: LevelTable,
    calendar: Calendar,
    missions_per_period: usize,
    rng: Option<Box<dyn RandomSource>>,
}

impl EngineBuilder {
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn levels(mut self, levels: LevelTable) -> Self {
        self.levels = levels;
        self
    }

    pub fn calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn missions_per_period(mut self, count: usize) -> Self {
        self.missions_per_period = count;
        self
    }

    pub fn random_source(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn build(self) -> GamificationEngine {
        let catalog = Arc::new(self.catalog);
        let levels = Arc::new(self.levels);
        let rng = self
            .rng
            .unwrap_or_else(|| Box::new(StdRng::from_entropy()));

        GamificationEngine {
            streaks: StreakTracker::new(self.store.clone(), self.calendar.clone()),
            generator: MissionGenerator::new(
                self.store.clone(),
                catalog.clone(),
                self.calendar.clone(),
                self.missions_per_period,
                rng,
            ),
            progress: MissionProgressTracker::new(self.store.clone(), self.calendar.clone()),
            claimer: RewardClaimer::new(self.store.clone(), levels.clone(), self.calendar.clone()),
            store: self.store,
            catalog,
            levels,
            calendar: self.calendar,
        }
    }
}

/// The four caller-facing gamification operations plus read-only views
pub struct GamificationEngine {
    streaks: StreakTracker,
    generator: MissionGenerator,
    progress: MissionProgressTracker,
    claimer: RewardClaimer,
    store: Arc<dyn GamificationStore>,
    catalog: Arc<Catalog>,
    levels: Arc<LevelTable>,
    calendar: Calendar,
}

impl GamificationEngine {
    pub fn builder(store: Arc<dyn GamificationStore>) -> EngineBuilder {
        EngineBuilder {
            store,
            catalog: Catalog::default(),
            levels: LevelTable::default(),
            calendar: Calendar::utc(),
            missions_per_period: DEFAULT_MISSIONS_PER_PERIOD,
            rng: None,
        }
    }

    /// Engine configured from a loaded [`Config`], on the system clock
    pub fn from_config(store: Arc<dyn GamificationStore>, config: &Config) -> anyhow::Result<Self> {
        let calendar = Calendar::new(config.utc_offset()?, Arc::new(SystemClock));
        Ok(Self::builder(store)
            .catalog(config.catalog().context("Invalid mission catalog")?)
            .levels(config.level_table().context("Invalid level table")?)
            .calendar(calendar)
            .missions_per_period(config.settings.missions_per_period)
            .build())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Count a qualifying user activity towards the daily streak
    pub fn record_activity(&self, user_id: &str) -> Result<StreakUpdate> {
        self.streaks.record_activity(user_id)
    }

    /// Active missions, generating the daily and weekly sets when due.
    ///
    /// Ordered daily, weekly, then special.
    pub fn get_missions(&self, user_id: &str) -> Result<Vec<MissionInstance>> {
        for period in [PeriodType::Daily, PeriodType::Weekly] {
            self.generator.ensure_missions_for_period(user_id, period)?;
        }

        let now = self.calendar.now_ms();
        let mut missions = Vec::new();
        for period in [PeriodType::Daily, PeriodType::Weekly, PeriodType::Special] {
            missions.extend(self.store.list_active_missions(user_id, period, now)?);
        }
        Ok(missions)
    }

    /// Report `amount` occurrences of the action behind `mission_key`
    pub fn advance_mission(
        &self,
        user_id: &str,
        mission_key: &str,
        amount: u32,
    ) -> Result<Vec<MissionInstance>> {
        self.progress.advance(user_id, mission_key, amount)
    }

    pub fn claim_mission(&self, user_id: &str, mission_id: &str) -> Result<ClaimOutcome> {
        self.claimer.claim(user_id, mission_id)
    }

    /// Issue a one-off special mission that expires at `expires_at`
    pub fn grant_special_mission(
        &self,
        user_id: &str,
        mission_key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<MissionInstance> {
        self.generator.grant_special(user_id, mission_key, expires_at)
    }

    /// XP and level position; users who never earned XP sit at level 1
    pub fn player_stats(&self, user_id: &str) -> Result<PlayerStats> {
        let total_xp = self
            .store
            .get_xp(user_id)?
            .map(|r| r.total_xp)
            .unwrap_or(0);
        Ok(PlayerStats::new(&self.levels, total_xp))
    }

    pub fn streak(&self, user_id: &str) -> Result<Option<StreakRecord>> {
        self.streaks.streak(user_id)
    }
}
