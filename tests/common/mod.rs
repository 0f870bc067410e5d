//! Shared test utilities for engine integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use questline::calendar::utc_offset;
use questline::missions::{FixedSequence, MissionCategory};
use questline::{
    Calendar, Catalog, EngineBuilder, GamificationEngine, ManualClock, MissionTemplate, PeriodType,
    SqliteStore,
};

/// Wednesday 2024-03-13 10:00 UTC
pub fn wednesday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 13, 10, 0, 0).unwrap()
}

/// Engine over an on-disk database in a temporary directory
pub struct TestEnv {
    pub dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub clock: Arc<ManualClock>,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = SqliteStore::open(&dir.path().join("questline.db"))
            .expect("Failed to open test database");
        Self {
            dir,
            store: Arc::new(store),
            clock: Arc::new(ManualClock::new(wednesday())),
        }
    }

    /// Builder preconfigured with the manual clock and a fixed sequence
    pub fn builder(&self) -> EngineBuilder {
        GamificationEngine::builder(self.store.clone())
            .calendar(Calendar::new(utc_offset(), self.clock.clone()))
            .random_source(FixedSequence::new(vec![0]))
    }

    pub fn engine(&self) -> GamificationEngine {
        self.builder().build()
    }
}

pub fn template(key: &str, period: PeriodType, target: u32, xp_reward: u32) -> MissionTemplate {
    MissionTemplate {
        key: key.to_string(),
        title: key.replace('_', " "),
        category: MissionCategory::Challenge,
        target,
        xp_reward,
        bonus_reward: None,
        period,
    }
}

/// One daily and one weekly template, so every set is fully determined
pub fn single_mission_catalog(key: &str, target: u32, xp_reward: u32) -> Catalog {
    Catalog::new(vec![
        template(key, PeriodType::Daily, target, xp_reward),
        template(&format!("{}_weekly", key), PeriodType::Weekly, target, xp_reward),
    ])
    .expect("Invalid test catalog")
}
